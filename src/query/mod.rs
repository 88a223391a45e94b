//! Query layer - predicate filtering and column projection over full scans.
//!
//! - [`Condition`] / [`CompareOp`] - `column op literal` filters
//! - [`QueryEngine`] - read-only scans built on the index and record codec

mod condition;
mod engine;

pub use condition::{compare_values, CompareOp, Condition};
pub use engine::QueryEngine;

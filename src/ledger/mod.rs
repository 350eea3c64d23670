//! Ledger module containing batch entry, matching and balance tracking

pub mod batch;
pub mod core;
pub mod engine;
pub mod lines;

pub use batch::*;
pub use core::*;
pub use engine::*;
pub use lines::{normalize_lines, NormalizedLines};

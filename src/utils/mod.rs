//! Utility modules

pub mod memory_store;
pub mod money;
pub mod validation;

pub use memory_store::*;
pub use money::*;
pub use validation::*;

// Re-export all model types from submodules
mod booking;
mod catalog;
mod common;

pub use booking::*;
pub use catalog::*;
pub use common::*;

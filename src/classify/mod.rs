//! Test-point classification against a selection.

pub mod classifier;

pub use classifier::*;

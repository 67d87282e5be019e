//! Mathematical utilities: deviation metrics between sampled curves.

pub mod deviation;

pub use deviation::*;

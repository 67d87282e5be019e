//! Data sources that are not plain files.
//!
//! - `sample`: seeded synthetic training / ideal / test data

pub mod sample;

pub use sample::{SyntheticConfig, SyntheticData, generate_synthetic, ideal_function, regular_grid};

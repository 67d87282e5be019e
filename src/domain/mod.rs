//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - sampled curves and curve tables (`SampleSeries`, `CurveSet`)
//! - selection outputs (`SelectionResult`, `SelectionEntry`)
//! - test observations and their classification (`TestPoint`, `AssignmentRecord`)
//! - run configuration (`RunConfig`, `AssignmentPolicy`)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;

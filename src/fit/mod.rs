//! Candidate selection.
//!
//! Responsibilities:
//!
//! - score every training curve against every candidate (parallel)
//! - pick one candidate per training curve under the configured policy
//! - record each pick's SSE and worst-case deviation (tolerance)

pub mod scoring;
pub mod selection;

pub use scoring::*;
pub use selection::*;

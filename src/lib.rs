//! `ideal-curves` library crate.
//!
//! Picks, for every training curve, the ideal function from a catalog that
//! minimizes the sum of squared deviations, then maps test points onto the
//! chosen functions within a tolerance band.
//!
//! The binary (`ideal`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - selection and classification can be reused from other Rust code

pub mod app;
pub mod classify;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod report;

//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - assignment sinks and CSV export (`export`)
//! - selection JSON read/write (`selection`)

pub mod export;
pub mod ingest;
pub mod selection;

pub use export::*;
pub use ingest::*;
pub use selection::*;

//! Read/write selection JSON files.
//!
//! A selection file is the portable result of `ideal select`:
//! - which candidate each training curve chose, with SSE and tolerance
//! - the policy and tolerance factor in effect
//! - when it was created and from which catalog
//!
//! `ideal classify` reloads it to classify new test data without re-selecting.
//! The schema is defined by `domain::SelectionFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{SelectionFile, SelectionResult};
use crate::error::AppError;

/// Tool name stamped into exported files.
pub const TOOL_NAME: &str = "ideal";

/// Wrap a selection with run metadata.
pub fn selection_file(
    selection: &SelectionResult,
    tolerance_factor: f64,
    ideal_source: Option<&Path>,
) -> SelectionFile {
    SelectionFile {
        tool: TOOL_NAME.to_string(),
        created_at: Utc::now(),
        tolerance_factor,
        ideal_source: ideal_source.map(|p| p.display().to_string()),
        selection: selection.clone(),
    }
}

/// Write a selection JSON file.
pub fn write_selection_json(path: &Path, file: &SelectionFile) -> Result<(), AppError> {
    let out = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create selection JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write selection JSON: {e}")))?;
    log::info!("wrote selection to {}", path.display());
    Ok(())
}

/// Read a selection JSON file.
pub fn read_selection_json(path: &Path) -> Result<SelectionFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open selection JSON '{}': {e}", path.display()))
    })?;
    let selection: SelectionFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid selection JSON: {e}")))?;
    if selection.selection.entries.is_empty() {
        return Err(AppError::new(3, "Selection file has no entries."));
    }
    Ok(selection)
}

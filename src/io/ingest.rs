//! CSV ingest and normalization.
//!
//! Two table shapes are supported:
//!
//! - **curve tables** (training / ideal): header `x,<id1>,<id2>,...`, one row per
//!   grid point
//! - **test points**: header `x,y`, one observation per row
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (row order is preserved)
//! - **Separation of concerns**: no selection/classification logic here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{CurveSet, TestPoint};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// A loaded curve table plus ingest diagnostics.
#[derive(Debug, Clone)]
pub struct CurveTable {
    pub curves: CurveSet,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Loaded test points plus ingest diagnostics.
#[derive(Debug, Clone)]
pub struct TestPoints {
    pub points: Vec<TestPoint>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a wide curve table (`x,<id>...`) from a CSV file.
pub fn load_curve_table(path: &Path) -> Result<CurveTable, AppError> {
    let file = open(path)?;
    let table = read_curve_table(file)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;
    log::info!(
        "loaded {} curves x {} points from {}",
        table.curves.len(),
        table.curves.grid_len(),
        path.display()
    );
    log_row_errors(path, &table.row_errors);
    Ok(table)
}

/// Load several curve tables and join their curves column-wise.
///
/// All tables must share one x-grid. Identifiers that repeat across files are
/// suffixed with the file's 1-based position.
pub fn load_training_tables(paths: &[impl AsRef<Path>]) -> Result<CurveTable, AppError> {
    if paths.is_empty() {
        return Err(AppError::new(2, "At least one training file is required."));
    }

    let mut parts = Vec::with_capacity(paths.len());
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    for path in paths {
        let table = load_curve_table(path.as_ref())?;
        rows_read += table.rows_read;
        row_errors.extend(table.row_errors);
        parts.push(table.curves);
    }

    let curves = CurveSet::concat(parts)?;
    Ok(CurveTable {
        curves,
        row_errors,
        rows_read,
    })
}

/// Load test points (`x,y`) from a CSV file.
pub fn load_test_points(path: &Path) -> Result<TestPoints, AppError> {
    let file = open(path)?;
    let points = read_test_points(file)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;
    log::info!("loaded {} test points from {}", points.points.len(), path.display());
    log_row_errors(path, &points.row_errors);
    Ok(points)
}

/// Parse a curve table from any reader.
pub fn read_curve_table<R: Read>(reader: R) -> Result<CurveTable, AppError> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    if !names.first().is_some_and(|n| n.eq_ignore_ascii_case("x")) {
        return Err(AppError::new(2, "First column must be `x`."));
    }
    let ids: Vec<String> = names[1..].to_vec();
    if ids.is_empty() {
        return Err(AppError::new(2, "Curve table has no curve columns."));
    }
    if let Some(blank) = ids.iter().position(String::is_empty) {
        return Err(AppError::new(2, format!("Column {} has an empty header.", blank + 2)));
    }

    let mut grid = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); ids.len()];
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1, records are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_curve_row(&record, &names) {
            Ok((x, ys)) => {
                grid.push(x);
                for (column, y) in columns.iter_mut().zip(ys) {
                    column.push(y);
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if grid.is_empty() {
        return Err(AppError::new(3, "No valid rows in curve table."));
    }

    let curves = CurveSet::new(grid, ids.into_iter().zip(columns).collect())?;
    Ok(CurveTable {
        curves,
        row_errors,
        rows_read,
    })
}

/// Parse test points from any reader.
pub fn read_test_points<R: Read>(reader: R) -> Result<TestPoints, AppError> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    let x_idx = column_index(&names, "x")?;
    let y_idx = column_index(&names, "y")?;

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let x = parse_f64(&record, x_idx, "x")?;
                let y = parse_f64(&record, y_idx, "y")?;
                Ok(TestPoint::new(x, y))
            });
        match parsed {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if points.is_empty() && rows_read > 0 {
        return Err(AppError::new(3, "No valid test points."));
    }

    Ok(TestPoints {
        points,
        row_errors,
        rows_read,
    })
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn column_index(names: &[String], wanted: &str) -> Result<usize, AppError> {
    names
        .iter()
        .position(|n| n.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{wanted}`")))
}

fn parse_curve_row(record: &StringRecord, names: &[String]) -> Result<(f64, Vec<f64>), String> {
    if record.len() != names.len() {
        return Err(format!(
            "Expected {} fields, found {}",
            names.len(),
            record.len()
        ));
    }
    let x = parse_f64(record, 0, "x")?;
    let ys = names[1..]
        .iter()
        .enumerate()
        .map(|(i, name)| parse_f64(record, i + 1, name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((x, ys))
}

fn parse_f64(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))?;
    let v = raw
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{raw}' in `{name}`"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite value '{raw}' in `{name}`"))
    }
}

fn log_row_errors(path: &Path, errors: &[RowError]) {
    if errors.is_empty() {
        return;
    }
    log::warn!("{}: skipped {} invalid rows", path.display(), errors.len());
    for e in errors {
        log::debug!("{}:{}: {}", path.display(), e.line, e.message);
    }
}

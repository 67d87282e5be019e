//! Sampled curves and curve tables.
//!
//! A `SampleSeries` is a single curve: ordered `(x, y)` pairs with unique x.
//! A `CurveSet` is a table of curves that all share one x-grid; it is used both
//! for the training curves and for the candidate ("ideal") catalog.
//!
//! Curve values are stored column-major in an `nalgebra` matrix
//! (rows = grid points, columns = curves) so that deviation math can operate
//! on column views without copying.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVectorView};
use thiserror::Error;

/// Construction errors for series and curve tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("x and y lengths differ ({x_len} vs {y_len})")]
    LengthMismatch { x_len: usize, y_len: usize },

    #[error("non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("duplicate x value {x}")]
    DuplicateX { x: f64 },

    #[error("duplicate curve identifier `{id}`")]
    DuplicateId { id: String },

    #[error("curve `{id}` has {len} values but the grid has {grid_len} points")]
    ColumnLength { id: String, len: usize, grid_len: usize },

    #[error("curve `{id}` is not sampled on the shared x-grid")]
    GridMismatch { id: String },
}

/// Hash key for exact x lookups.
///
/// Uses the IEEE bit pattern so lookups are exact; `-0.0` is folded into `0.0`
/// so the two compare equal like they do under `==`.
pub fn grid_key(x: f64) -> u64 {
    if x == 0.0 { 0.0f64.to_bits() } else { x.to_bits() }
}

/// An ordered, immutable sequence of `(x, y)` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl SampleSeries {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, SeriesError> {
        if x.len() != y.len() {
            return Err(SeriesError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        validate_finite(&x)?;
        validate_finite(&y)?;
        validate_unique(&x)?;
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A set of named curves sharing one x-grid.
///
/// The order of identifiers is the declared catalog order; it is the
/// tie-break key everywhere a "lowest identifier" rule applies.
#[derive(Debug, Clone)]
pub struct CurveSet {
    grid: Vec<f64>,
    ids: Vec<String>,
    values: DMatrix<f64>,
    row_index: HashMap<u64, usize>,
}

impl CurveSet {
    /// Build a curve set from a shared grid and one value column per curve.
    pub fn new(grid: Vec<f64>, columns: Vec<(String, Vec<f64>)>) -> Result<Self, SeriesError> {
        validate_finite(&grid)?;
        validate_unique(&grid)?;

        let rows = grid.len();
        let mut ids = Vec::with_capacity(columns.len());
        let mut flat = Vec::with_capacity(rows * columns.len());
        for (id, column) in columns {
            if ids.contains(&id) {
                return Err(SeriesError::DuplicateId { id });
            }
            if column.len() != rows {
                return Err(SeriesError::ColumnLength {
                    id,
                    len: column.len(),
                    grid_len: rows,
                });
            }
            validate_finite(&column)?;
            flat.extend_from_slice(&column);
            ids.push(id);
        }

        let values = DMatrix::from_vec(rows, ids.len(), flat);
        let row_index = grid
            .iter()
            .enumerate()
            .map(|(row, &x)| (grid_key(x), row))
            .collect();

        Ok(Self {
            grid,
            ids,
            values,
            row_index,
        })
    }

    /// Build a curve set from individual series, which must all share one grid.
    pub fn from_series(series: Vec<(String, SampleSeries)>) -> Result<Self, SeriesError> {
        let Some((_, first)) = series.first() else {
            return Self::new(Vec::new(), Vec::new());
        };
        let grid = first.x().to_vec();

        let mut columns = Vec::with_capacity(series.len());
        for (id, s) in series {
            if s.x() != grid.as_slice() {
                return Err(SeriesError::GridMismatch { id });
            }
            columns.push((id, s.y().to_vec()));
        }
        Self::new(grid, columns)
    }

    /// Join several curve sets column-wise.
    ///
    /// All parts must share the same grid. Identifiers that collide with an
    /// earlier column are renamed `<id>_<part index>` (1-based); the suffix
    /// repeats until the name is free.
    pub fn concat(parts: Vec<CurveSet>) -> Result<Self, SeriesError> {
        let mut parts = parts.into_iter();
        let Some(first) = parts.next() else {
            return Self::new(Vec::new(), Vec::new());
        };

        let grid = first.grid.clone();
        let mut columns: Vec<(String, Vec<f64>)> = first.columns().collect();
        for (offset, part) in parts.enumerate() {
            let part_no = offset + 2;
            for (id, column) in part.columns() {
                if part.grid != grid {
                    return Err(SeriesError::GridMismatch { id });
                }
                let id = unused_id(&columns, id, part_no);
                columns.push((id, column));
            }
        }

        Self::new(grid, columns)
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of curves.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn grid_len(&self) -> usize {
        self.grid.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|existing| existing == id)
    }

    /// Column view of curve `idx`'s y-values along the grid.
    pub fn column(&self, idx: usize) -> DVectorView<'_, f64> {
        self.values.column(idx)
    }

    /// Grid row holding exactly `x`, if present.
    pub fn row_of(&self, x: f64) -> Option<usize> {
        self.row_index.get(&grid_key(x)).copied()
    }

    /// Value of curve `idx` at grid row `row`.
    pub fn value(&self, row: usize, idx: usize) -> f64 {
        self.values[(row, idx)]
    }

    /// Curve `idx` at `x`, when `x` lies exactly on the grid.
    pub fn value_at(&self, idx: usize, x: f64) -> Option<f64> {
        self.row_of(x).map(|row| self.value(row, idx))
    }

    /// Materialize curve `idx` as a standalone series.
    pub fn series(&self, idx: usize) -> SampleSeries {
        SampleSeries {
            x: self.grid.clone(),
            y: self.column(idx).iter().copied().collect(),
        }
    }

    fn columns(&self) -> impl Iterator<Item = (String, Vec<f64>)> + '_ {
        self.ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), self.column(idx).iter().copied().collect()))
    }
}

fn unused_id(columns: &[(String, Vec<f64>)], id: String, part_no: usize) -> String {
    let taken = |name: &str| columns.iter().any(|(existing, _)| existing == name);
    let mut name = id;
    while taken(&name) {
        name = format!("{name}_{part_no}");
    }
    name
}

fn validate_finite(values: &[f64]) -> Result<(), SeriesError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(SeriesError::NonFinite { index }),
        None => Ok(()),
    }
}

fn validate_unique(x: &[f64]) -> Result<(), SeriesError> {
    let mut seen = std::collections::HashSet::with_capacity(x.len());
    for &v in x {
        if !seen.insert(grid_key(v)) {
            return Err(SeriesError::DuplicateX { x: v });
        }
    }
    Ok(())
}

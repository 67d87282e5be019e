//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the selector and the classifier in-memory
//! - exported to JSON/CSV
//! - reloaded later to classify new test data without re-selecting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default acceptance band multiplier applied to a selection's tolerance.
pub const DEFAULT_TOLERANCE_FACTOR: f64 = std::f64::consts::SQRT_2;

/// Whether one candidate may be chosen for several training curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentPolicy {
    /// A candidate may serve any number of training curves.
    #[default]
    Shared,
    /// Each candidate serves at most one training curve (greedy by SSE).
    Distinct,
}

/// The candidate chosen for one training curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub training_id: String,
    pub candidate_id: String,
    /// Sum of squared deviations against the training curve.
    pub sse: f64,
    /// Maximum absolute pointwise deviation against the training curve.
    pub tolerance: f64,
}

/// Selector output: one entry per training curve, in training order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub policy: AssignmentPolicy,
    pub entries: Vec<SelectionEntry>,
}

/// A single test observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestPoint {
    pub x: f64,
    pub y: f64,
}

impl TestPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Outcome of classifying one test point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    /// `x` is not on the grid of any chosen candidate.
    NoGridMatch,
    /// The nearest chosen candidate deviates more than its acceptance bound.
    ToleranceExceeded,
}

impl AssignmentStatus {
    pub fn label(self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::NoGridMatch => "no_grid_match",
            AssignmentStatus::ToleranceExceeded => "tolerance_exceeded",
        }
    }
}

/// Nearest chosen candidate for a test point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCandidate {
    pub candidate_id: String,
    pub candidate_y: f64,
    pub deviation: f64,
}

/// Classifier output for one test point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub point: TestPoint,
    pub status: AssignmentStatus,
    /// Present whenever some chosen candidate had `x` on its grid,
    /// including rejected points (for diagnostics).
    pub nearest: Option<NearestCandidate>,
}

impl AssignmentRecord {
    pub fn accepted(&self) -> bool {
        self.status == AssignmentStatus::Assigned
    }

    /// The assigned candidate, only when the point was accepted.
    pub fn assigned_candidate(&self) -> Option<&str> {
        if self.accepted() {
            self.nearest.as_ref().map(|n| n.candidate_id.as_str())
        } else {
            None
        }
    }

    pub fn deviation(&self) -> Option<f64> {
        self.nearest.as_ref().map(|n| n.deviation)
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `.env` / defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Training tables; their curves are joined column-wise in this order.
    pub train_paths: Vec<PathBuf>,
    pub ideal_path: PathBuf,
    pub test_path: Option<PathBuf>,

    pub tolerance_factor: f64,
    pub policy: AssignmentPolicy,
    /// Use rayon for the score matrix and batch classification.
    pub parallel: bool,

    /// Number of assignment rows to print (0 = none).
    pub show: usize,
    pub quiet: bool,

    pub export_results: Option<PathBuf>,
    pub export_selection: Option<PathBuf>,
}

/// A saved selection file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionFile {
    pub tool: String,
    pub created_at: DateTime<Utc>,
    pub tolerance_factor: f64,
    /// Candidate catalog the selection was made from (for reference only).
    pub ideal_source: Option<String>,
    pub selection: SelectionResult,
}

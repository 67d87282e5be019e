//! Nearest-candidate classification of test points.
//!
//! For a test point `(x, y)`:
//! 1. look up every chosen candidate at `x` (exact grid match)
//! 2. take the candidate with the smallest `|cand(x) - y|` (ties: lowest catalog index)
//! 3. accept iff that deviation is `<= factor * tol`, where `tol` comes from
//!    the training curve that chose the candidate
//!
//! Unmatched or rejected points are results, not errors: every input point
//! yields exactly one record, in input order.

use rayon::prelude::*;
use thiserror::Error;

use crate::domain::{
    AssignmentRecord, AssignmentStatus, CurveSet, NearestCandidate, SelectionResult, TestPoint,
};
use crate::math::within_bound;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("selected candidate `{id}` is not in the candidate set")]
    UnknownCandidate { id: String },

    #[error("tolerance factor must be finite and >= 0 (got {0})")]
    InvalidToleranceFactor(f64),
}

/// A chosen candidate as seen by the classifier.
#[derive(Debug, Clone)]
struct Eligible {
    /// Column in the candidate set (catalog order).
    column: usize,
    /// Training curve whose tolerance bounds this candidate.
    training_id: String,
    tolerance: f64,
}

/// Reusable classifier over a fixed selection.
///
/// Building one resolves the selection against the catalog once; it can then
/// classify single points or batches any number of times.
#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    candidates: &'a CurveSet,
    eligible: Vec<Eligible>,
    tolerance_factor: f64,
}

impl<'a> Classifier<'a> {
    pub fn new(
        selection: &SelectionResult,
        candidates: &'a CurveSet,
        tolerance_factor: f64,
    ) -> Result<Self, ClassifyError> {
        if !(tolerance_factor.is_finite() && tolerance_factor >= 0.0) {
            return Err(ClassifyError::InvalidToleranceFactor(tolerance_factor));
        }

        // Collapse candidates chosen by several training curves. The widest
        // tolerance wins; on equal tolerances the earlier training curve is kept.
        let mut eligible: Vec<Eligible> = Vec::with_capacity(selection.entries.len());
        for entry in &selection.entries {
            let column = candidates
                .index_of(&entry.candidate_id)
                .ok_or_else(|| ClassifyError::UnknownCandidate {
                    id: entry.candidate_id.clone(),
                })?;

            match eligible.iter_mut().find(|e| e.column == column) {
                Some(existing) => {
                    if entry.tolerance > existing.tolerance {
                        existing.tolerance = entry.tolerance;
                        existing.training_id = entry.training_id.clone();
                    }
                }
                None => eligible.push(Eligible {
                    column,
                    training_id: entry.training_id.clone(),
                    tolerance: entry.tolerance,
                }),
            }
        }
        eligible.sort_by_key(|e| e.column);

        Ok(Self {
            candidates,
            eligible,
            tolerance_factor,
        })
    }

    pub fn tolerance_factor(&self) -> f64 {
        self.tolerance_factor
    }

    /// Identifiers of the distinct chosen candidates, in catalog order.
    pub fn candidate_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.eligible
            .iter()
            .map(|e| self.candidates.ids()[e.column].as_str())
    }

    /// Training curve whose tolerance applies to `candidate_id`, with that tolerance.
    pub fn bound_for(&self, candidate_id: &str) -> Option<(&str, f64)> {
        let column = self.candidates.index_of(candidate_id)?;
        self.eligible
            .iter()
            .find(|e| e.column == column)
            .map(|e| (e.training_id.as_str(), e.tolerance))
    }

    /// Classify one point.
    pub fn classify_point(&self, point: TestPoint) -> AssignmentRecord {
        let no_match = AssignmentRecord {
            point,
            status: AssignmentStatus::NoGridMatch,
            nearest: None,
        };
        if self.eligible.is_empty() {
            return no_match;
        }
        let Some(row) = self.candidates.row_of(point.x) else {
            return no_match;
        };

        let mut best: Option<(&Eligible, f64, f64)> = None;
        for e in &self.eligible {
            let candidate_y = self.candidates.value(row, e.column);
            let deviation = (candidate_y - point.y).abs();
            if best.is_none_or(|(_, _, best_dev)| deviation < best_dev) {
                best = Some((e, candidate_y, deviation));
            }
        }
        let Some((e, candidate_y, deviation)) = best else {
            return no_match;
        };

        let status = if within_bound(deviation, e.tolerance, self.tolerance_factor) {
            AssignmentStatus::Assigned
        } else {
            AssignmentStatus::ToleranceExceeded
        };

        AssignmentRecord {
            point,
            status,
            nearest: Some(NearestCandidate {
                candidate_id: self.candidates.ids()[e.column].clone(),
                candidate_y,
                deviation,
            }),
        }
    }

    /// Classify a batch sequentially.
    pub fn classify_all(&self, points: &[TestPoint]) -> Vec<AssignmentRecord> {
        points.iter().map(|&p| self.classify_point(p)).collect()
    }

    /// Classify a batch with rayon. Output order matches input order.
    pub fn classify_all_parallel(&self, points: &[TestPoint]) -> Vec<AssignmentRecord> {
        points.par_iter().map(|&p| self.classify_point(p)).collect()
    }
}

/// One-shot classification of `points` against a selection.
pub fn classify(
    selection: &SelectionResult,
    candidates: &CurveSet,
    tolerance_factor: f64,
    points: &[TestPoint],
) -> Result<Vec<AssignmentRecord>, ClassifyError> {
    let classifier = Classifier::new(selection, candidates, tolerance_factor)?;
    Ok(classifier.classify_all(points))
}

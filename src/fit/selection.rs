//! Candidate selection by least squares.
//!
//! For every training curve `t` and candidate `c` on the shared grid:
//!
//! ```text
//! sse(t, c) = Σ_i (train[t].y_i - cand[c].y_i)^2
//! ```
//!
//! Selection rules:
//! 1. `shared` policy: each training curve takes `argmin_c sse(t, c)`, exact ties
//!    going to the lowest catalog index. Several curves may pick the same candidate.
//! 2. `distinct` policy: pairs are taken greedily in ascending SSE order
//!    (ties: lower training index, then lower catalog index), skipping
//!    training curves already served and candidates already used.
//!
//! For the chosen pair we also record `tol(t) = max_i |train[t].y_i - cand[c*].y_i|`,
//! which the classifier uses as the acceptance bound.

use thiserror::Error;

use crate::domain::{AssignmentPolicy, CurveSet, SelectionEntry, SelectionResult};
use crate::fit::scoring::ScoreMatrix;
use crate::math::deviation_stats;

/// Precondition failures of [`select`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectError {
    #[error("grid mismatch: {detail}")]
    GridMismatch { detail: String },

    #[error("candidate set is empty")]
    EmptyCandidateSet,

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("distinct assignment needs {needed} candidates but only {available} are available")]
    InsufficientCandidates { needed: usize, available: usize },
}

/// Selection knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    pub policy: AssignmentPolicy,
    /// Evaluate the score matrix with rayon.
    pub parallel: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            policy: AssignmentPolicy::Shared,
            parallel: true,
        }
    }
}

/// Choose one candidate per training curve.
pub fn select(
    training: &CurveSet,
    candidates: &CurveSet,
    options: SelectOptions,
) -> Result<SelectionResult, SelectError> {
    if candidates.is_empty() {
        return Err(SelectError::EmptyCandidateSet);
    }
    if training.is_empty() {
        return Err(SelectError::EmptyTrainingSet);
    }
    check_grids(training.grid(), candidates.grid())?;

    let scores = ScoreMatrix::compute(training, candidates, options.parallel);
    let chosen = match options.policy {
        AssignmentPolicy::Shared => choose_shared(&scores),
        AssignmentPolicy::Distinct => choose_distinct(&scores)?,
    };

    let entries = chosen
        .into_iter()
        .enumerate()
        .map(|(t, c)| {
            let stats = deviation_stats(training.column(t), candidates.column(c));
            let entry = SelectionEntry {
                training_id: training.ids()[t].clone(),
                candidate_id: candidates.ids()[c].clone(),
                sse: stats.sse,
                tolerance: stats.max_abs,
            };
            log::debug!(
                "selected {} for {} (sse={:.6}, tol={:.6})",
                entry.candidate_id,
                entry.training_id,
                entry.sse,
                entry.tolerance
            );
            entry
        })
        .collect();

    Ok(SelectionResult {
        policy: options.policy,
        entries,
    })
}

/// Verify both grids are non-empty and identical (count, values, order).
pub fn check_grids(training: &[f64], candidates: &[f64]) -> Result<(), SelectError> {
    if training.is_empty() || candidates.is_empty() {
        return Err(SelectError::GridMismatch {
            detail: format!(
                "empty x-grid (training has {} points, candidates have {})",
                training.len(),
                candidates.len()
            ),
        });
    }
    if training.len() != candidates.len() {
        return Err(SelectError::GridMismatch {
            detail: format!(
                "training has {} points, candidates have {}",
                training.len(),
                candidates.len()
            ),
        });
    }
    if let Some(i) = training.iter().zip(candidates).position(|(a, b)| a != b) {
        return Err(SelectError::GridMismatch {
            detail: format!(
                "x[{i}] is {} in training but {} in candidates",
                training[i], candidates[i]
            ),
        });
    }
    Ok(())
}

fn choose_shared(scores: &ScoreMatrix) -> Vec<usize> {
    (0..scores.n_training())
        .filter_map(|t| scores.argmin(t).map(|(c, _)| c))
        .collect()
}

fn choose_distinct(scores: &ScoreMatrix) -> Result<Vec<usize>, SelectError> {
    let n = scores.n_training();
    let m = scores.n_candidates();
    if m < n {
        return Err(SelectError::InsufficientCandidates {
            needed: n,
            available: m,
        });
    }

    let mut cells: Vec<(usize, usize)> = (0..n).flat_map(|t| (0..m).map(move |c| (t, c))).collect();
    cells.sort_by(|&(ta, ca), &(tb, cb)| {
        scores
            .get(ta, ca)
            .total_cmp(&scores.get(tb, cb))
            .then(ta.cmp(&tb))
            .then(ca.cmp(&cb))
    });

    let mut chosen: Vec<Option<usize>> = vec![None; n];
    let mut used = vec![false; m];
    let mut remaining = n;
    for (t, c) in cells {
        if remaining == 0 {
            break;
        }
        if chosen[t].is_some() || used[c] {
            continue;
        }
        chosen[t] = Some(c);
        used[c] = true;
        remaining -= 1;
    }

    // m >= n guarantees every training curve was served.
    Ok(chosen.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<f64> {
        vec![-2.0, -1.0, 0.0, 1.0, 2.0]
    }

    fn curve(id: &str, f: impl Fn(f64) -> f64) -> (String, Vec<f64>) {
        (id.to_string(), grid().into_iter().map(f).collect())
    }

    fn shared() -> SelectOptions {
        SelectOptions::default()
    }

    #[test]
    fn picks_exact_candidate_with_zero_error() {
        let training = CurveSet::new(grid(), vec![curve("y1", |x| x)]).unwrap();
        let candidates = CurveSet::new(grid(), vec![curve("a", |x| x), curve("b", |x| 2.0 * x)]).unwrap();

        let result = select(&training, &candidates, shared()).unwrap();
        assert_eq!(result.entries.len(), 1);
        let entry = &result.entries[0];
        assert_eq!(entry.training_id, "y1");
        assert_eq!(entry.candidate_id, "a");
        assert_eq!(entry.sse, 0.0);
        assert_eq!(entry.tolerance, 0.0);
    }

    #[test]
    fn tolerance_is_max_abs_not_sse() {
        let training = CurveSet::new(grid(), vec![curve("y1", |x| x + if x == 2.0 { 0.5 } else { 0.1 })]).unwrap();
        let candidates = CurveSet::new(grid(), vec![curve("a", |x| x)]).unwrap();

        let entry = &select(&training, &candidates, shared()).unwrap().entries[0];
        assert!((entry.tolerance - 0.5).abs() < 1e-12);
        assert!((entry.sse - (4.0 * 0.01 + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn empty_candidates_fail() {
        let training = CurveSet::new(grid(), vec![curve("y1", |x| x)]).unwrap();
        let candidates = CurveSet::new(grid(), Vec::new()).unwrap();
        let err = select(&training, &candidates, shared()).unwrap_err();
        assert_eq!(err, SelectError::EmptyCandidateSet);
    }

    #[test]
    fn mismatched_grids_fail() {
        let training = CurveSet::new(grid(), vec![curve("y1", |x| x)]).unwrap();

        let shifted = vec![-2.0, -1.0, 0.0, 1.0, 2.5];
        let candidates = CurveSet::new(shifted, vec![("a".into(), vec![0.0; 5])]).unwrap();
        let err = select(&training, &candidates, shared()).unwrap_err();
        assert!(matches!(err, SelectError::GridMismatch { .. }));

        let shorter = vec![-2.0, -1.0, 0.0, 1.0];
        let candidates = CurveSet::new(shorter, vec![("a".into(), vec![0.0; 4])]).unwrap();
        let err = select(&training, &candidates, shared()).unwrap_err();
        assert!(matches!(err, SelectError::GridMismatch { .. }));

        let reordered = vec![-1.0, -2.0, 0.0, 1.0, 2.0];
        let candidates = CurveSet::new(reordered, vec![("a".into(), vec![0.0; 5])]).unwrap();
        let err = select(&training, &candidates, shared()).unwrap_err();
        assert!(matches!(err, SelectError::GridMismatch { .. }));
    }

    #[test]
    fn empty_grid_is_a_grid_mismatch() {
        let training = CurveSet::new(Vec::new(), vec![("y1".into(), Vec::new())]).unwrap();
        let candidates = CurveSet::new(Vec::new(), vec![("a".into(), Vec::new())]).unwrap();
        let err = select(&training, &candidates, shared()).unwrap_err();
        assert!(matches!(err, SelectError::GridMismatch { .. }));
    }

    #[test]
    fn ties_go_to_lowest_catalog_index() {
        let training = CurveSet::new(grid(), vec![curve("y1", |_| 0.0)]).unwrap();
        let candidates = CurveSet::new(
            grid(),
            vec![curve("z", |_| 5.0), curve("up", |_| 1.0), curve("down", |_| -1.0)],
        )
        .unwrap();

        for parallel in [true, false, true] {
            let options = SelectOptions {
                parallel,
                ..shared()
            };
            let result = select(&training, &candidates, options).unwrap();
            assert_eq!(result.entries[0].candidate_id, "up");
        }
    }

    #[test]
    fn shared_policy_allows_reuse() {
        let training = CurveSet::new(grid(), vec![curve("y1", |x| x), curve("y2", |x| x + 0.01)]).unwrap();
        let candidates = CurveSet::new(grid(), vec![curve("a", |x| x), curve("b", |x| x + 1.0)]).unwrap();

        let result = select(&training, &candidates, shared()).unwrap();
        assert_eq!(result.entries[0].candidate_id, "a");
        assert_eq!(result.entries[1].candidate_id, "a");
    }

    #[test]
    fn distinct_policy_never_reuses() {
        let training = CurveSet::new(grid(), vec![curve("y1", |x| x), curve("y2", |x| x + 0.01)]).unwrap();
        let candidates = CurveSet::new(grid(), vec![curve("a", |x| x), curve("b", |x| x + 1.0)]).unwrap();

        let options = SelectOptions {
            policy: AssignmentPolicy::Distinct,
            parallel: true,
        };
        let result = select(&training, &candidates, options).unwrap();
        assert_eq!(result.policy, AssignmentPolicy::Distinct);
        // y1 has the globally best pair (sse 0), so y2 falls back to b.
        assert_eq!(result.entries[0].candidate_id, "a");
        assert_eq!(result.entries[1].candidate_id, "b");
        assert!((result.entries[1].tolerance - 0.99).abs() < 1e-12);
    }

    #[test]
    fn distinct_ties_go_to_lower_training_then_lower_candidate() {
        let training = CurveSet::new(grid(), vec![curve("y1", |_| 0.0), curve("y2", |_| 0.0)]).unwrap();
        let candidates = CurveSet::new(
            grid(),
            vec![
                curve("far", |_| 5.0),
                curve("exact", |_| 0.0),
                curve("up", |_| 1.0),
                curve("down", |_| -1.0),
            ],
        )
        .unwrap();

        let mut runs = Vec::new();
        for parallel in [false, true] {
            let options = SelectOptions {
                policy: AssignmentPolicy::Distinct,
                parallel,
            };
            let result = select(&training, &candidates, options).unwrap();
            // Both curves tie on `exact`; y1 wins it. y2 then ties on `up`/`down`.
            assert_eq!(result.entries[0].candidate_id, "exact");
            assert_eq!(result.entries[0].sse, 0.0);
            assert_eq!(result.entries[1].candidate_id, "up");
            assert_eq!(result.entries[1].sse, 5.0);
            runs.push(result);
        }
        assert_eq!(runs[0], runs[1]);
    }

    #[test]
    fn distinct_policy_needs_enough_candidates() {
        let training = CurveSet::new(grid(), vec![curve("y1", |x| x), curve("y2", |x| -x)]).unwrap();
        let candidates = CurveSet::new(grid(), vec![curve("a", |x| x)]).unwrap();

        let options = SelectOptions {
            policy: AssignmentPolicy::Distinct,
            parallel: false,
        };
        let err = select(&training, &candidates, options).unwrap_err();
        assert_eq!(
            err,
            SelectError::InsufficientCandidates {
                needed: 2,
                available: 1
            }
        );
    }
}

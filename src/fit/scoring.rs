//! Training × candidate score matrix.
//!
//! Every `(training, candidate)` cell is independent, so cells are evaluated in
//! parallel and collected back into row-major order. Collection is indexed,
//! which keeps the matrix identical to a sequential evaluation.

use rayon::prelude::*;

use crate::domain::CurveSet;
use crate::math::sum_squared_deviation;

/// SSE of every training curve against every candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    n_training: usize,
    n_candidates: usize,
    /// Row-major: `sse[t * n_candidates + c]`.
    sse: Vec<f64>,
}

impl ScoreMatrix {
    /// Evaluate all cells. Callers must have checked that the grids agree.
    pub fn compute(training: &CurveSet, candidates: &CurveSet, parallel: bool) -> Self {
        let n_training = training.len();
        let n_candidates = candidates.len();
        let cell = |idx: usize| {
            let (t, c) = (idx / n_candidates, idx % n_candidates);
            sum_squared_deviation(training.column(t), candidates.column(c))
        };

        let cells = n_training * n_candidates;
        let sse = if parallel {
            (0..cells).into_par_iter().map(cell).collect()
        } else {
            (0..cells).map(cell).collect()
        };

        Self {
            n_training,
            n_candidates,
            sse,
        }
    }

    pub fn n_training(&self) -> usize {
        self.n_training
    }

    pub fn n_candidates(&self) -> usize {
        self.n_candidates
    }

    pub fn get(&self, training: usize, candidate: usize) -> f64 {
        self.sse[training * self.n_candidates + candidate]
    }

    /// Scores of one training curve against the whole catalog.
    pub fn row(&self, training: usize) -> &[f64] {
        let start = training * self.n_candidates;
        &self.sse[start..start + self.n_candidates]
    }

    /// Lowest-SSE candidate for a training curve.
    ///
    /// Exact ties go to the lowest catalog index. Returns `None` for an empty
    /// catalog.
    pub fn argmin(&self, training: usize) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (c, &sse) in self.row(training).iter().enumerate() {
            if best.is_none_or(|(_, best_sse)| sse < best_sse) {
                best = Some((c, sse));
            }
        }
        best
    }
}

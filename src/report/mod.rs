//! Reporting utilities: assignment counts and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{AssignmentRecord, AssignmentStatus};

/// Per-status counts over one classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentSummary {
    pub total: usize,
    pub assigned: usize,
    pub tolerance_exceeded: usize,
    pub no_grid_match: usize,
    /// Accepted points per candidate id, in first-seen order.
    pub per_candidate: Vec<(String, usize)>,
}

/// Count outcomes per status and per assigned candidate.
pub fn summarize(records: &[AssignmentRecord]) -> AssignmentSummary {
    let mut summary = AssignmentSummary {
        total: records.len(),
        ..AssignmentSummary::default()
    };

    for r in records {
        match r.status {
            AssignmentStatus::Assigned => summary.assigned += 1,
            AssignmentStatus::ToleranceExceeded => summary.tolerance_exceeded += 1,
            AssignmentStatus::NoGridMatch => summary.no_grid_match += 1,
        }
        if let Some(id) = r.assigned_candidate() {
            match summary.per_candidate.iter_mut().find(|(c, _)| c == id) {
                Some((_, n)) => *n += 1,
                None => summary.per_candidate.push((id.to_string(), 1)),
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NearestCandidate, TestPoint};

    fn record(status: AssignmentStatus, id: Option<&str>) -> AssignmentRecord {
        AssignmentRecord {
            point: TestPoint::new(0.0, 0.0),
            status,
            nearest: id.map(|id| NearestCandidate {
                candidate_id: id.to_string(),
                candidate_y: 0.0,
                deviation: 0.0,
            }),
        }
    }

    #[test]
    fn summarize_counts_each_status() {
        let records = vec![
            record(AssignmentStatus::Assigned, Some("y42")),
            record(AssignmentStatus::Assigned, Some("y11")),
            record(AssignmentStatus::Assigned, Some("y42")),
            record(AssignmentStatus::ToleranceExceeded, Some("y11")),
            record(AssignmentStatus::NoGridMatch, None),
        ];

        let summary = summarize(&records);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.assigned, 3);
        assert_eq!(summary.tolerance_exceeded, 1);
        assert_eq!(summary.no_grid_match, 1);
        assert_eq!(
            summary.per_candidate,
            vec![("y42".to_string(), 2), ("y11".to_string(), 1)]
        );
    }
}

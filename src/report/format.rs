//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the selection/classification code stays clean and testable
//! - output changes are localized

use crate::domain::{AssignmentRecord, CurveSet, RunConfig, SelectionResult};
use crate::report::AssignmentSummary;

/// Format the run header (inputs + settings).
pub fn format_run_header(training: &CurveSet, candidates: &CurveSet, config: &RunConfig) -> String {
    let mut out = String::new();

    out.push_str("=== ideal - least-squares curve matching ===\n");
    out.push_str(&format!(
        "Training: {} curves from {} file(s)\n",
        training.len(),
        config.train_paths.len()
    ));
    out.push_str(&format!(
        "Ideal: {} candidates ({})\n",
        candidates.len(),
        config.ideal_path.display()
    ));
    out.push_str(&format!(
        "Grid: n={} | x=[{}, {}]\n",
        training.grid_len(),
        fmt_opt(training.grid().first().copied()),
        fmt_opt(training.grid().last().copied()),
    ));
    out.push_str(&format!(
        "Policy: {:?} | tolerance factor: {:.6}\n",
        config.policy, config.tolerance_factor
    ));

    out
}

/// Format the selection table.
pub fn format_selection(selection: &SelectionResult, tolerance_factor: f64) -> String {
    let mut out = String::new();

    out.push_str("Selected candidates:\n");
    out.push_str(
        format!(
            "{:<12} {:<12} {:>16} {:>12} {:>12}",
            "training", "candidate", "sse", "tolerance", "bound"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<12} {:-<12} {:-<16} {:-<12} {:-<12}", "", "", "", "", "").trim_end());
    out.push('\n');

    for e in &selection.entries {
        out.push_str(
            format!(
                "{:<12} {:<12} {:>16.6} {:>12.6} {:>12.6}",
                truncate(&e.training_id, 12),
                truncate(&e.candidate_id, 12),
                e.sse,
                e.tolerance,
                e.tolerance * tolerance_factor,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format the outcome counts.
pub fn format_summary(summary: &AssignmentSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Test points: {} | assigned={} | tolerance_exceeded={} | no_grid_match={}\n",
        summary.total, summary.assigned, summary.tolerance_exceeded, summary.no_grid_match
    ));
    for (id, n) in &summary.per_candidate {
        out.push_str(&format!("  {id:<12} {n}\n"));
    }

    out
}

/// Format the first `limit` assignment records.
pub fn format_assignments(records: &[AssignmentRecord], limit: usize) -> String {
    let mut out = String::new();

    out.push_str(
        format!(
            "{:>12} {:>12} {:<20} {:<12} {:>12} {:>12}",
            "x", "y", "status", "candidate", "cand_y", "deviation"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<12} {:-<12} {:-<20} {:-<12} {:-<12} {:-<12}", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in records.iter().take(limit) {
        let nearest = r.nearest.as_ref();
        out.push_str(
            format!(
                "{:>12.4} {:>12.4} {:<20} {:<12} {:>12} {:>12}",
                r.point.x,
                r.point.y,
                r.status.label(),
                truncate(nearest.map(|n| n.candidate_id.as_str()).unwrap_or("-"), 12),
                fmt_opt(nearest.map(|n| n.candidate_y)),
                fmt_opt(nearest.map(|n| n.deviation)),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if records.len() > limit {
        out.push_str(&format!("... {} more\n", records.len() - limit));
    }

    out
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssignmentPolicy, AssignmentStatus, NearestCandidate, SelectionEntry, TestPoint};

    #[test]
    fn selection_table_shows_scaled_bound() {
        let selection = SelectionResult {
            policy: AssignmentPolicy::Shared,
            entries: vec![SelectionEntry {
                training_id: "y1".into(),
                candidate_id: "y42".into(),
                sse: 33.0,
                tolerance: 0.5,
            }],
        };
        let text = format_selection(&selection, 2.0);
        let row = text.lines().nth(3).unwrap();
        assert!(row.starts_with("y1"));
        assert!(row.contains("y42"));
        assert!(row.ends_with("1.000000"));
    }

    #[test]
    fn assignment_table_truncates_to_limit() {
        let records: Vec<AssignmentRecord> = (0..5)
            .map(|i| AssignmentRecord {
                point: TestPoint::new(i as f64, 0.0),
                status: AssignmentStatus::Assigned,
                nearest: Some(NearestCandidate {
                    candidate_id: "y1".into(),
                    candidate_y: 0.0,
                    deviation: 0.0,
                }),
            })
            .collect();
        let text = format_assignments(&records, 2);
        assert_eq!(text.lines().count(), 2 + 2 + 1);
        assert!(text.ends_with("... 3 more\n"));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("short", 12), "short");
        assert_eq!(truncate("abcdefghijklmnop", 6), "abcde.");
    }
}

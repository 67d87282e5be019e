//! Shared "match pipeline" logic used by the CLI subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load training + ideal tables -> select -> load test points -> classify -> summarize
//!
//! The subcommands can then focus on presentation (printing vs exports).

use crate::classify::Classifier;
use crate::domain::{AssignmentRecord, RunConfig, SelectionResult, TestPoint};
use crate::error::AppError;
use crate::fit::{SelectOptions, select};
use crate::io::{AssignmentSink, CurveTable, TestPoints, VecSink, load_curve_table, load_test_points, load_training_tables};
use crate::report::{AssignmentSummary, summarize};

/// Points handed to a sink per batch.
const CLASSIFY_BATCH: usize = 1024;

/// Outputs of the selection stage.
#[derive(Debug, Clone)]
pub struct SelectOutput {
    pub training: CurveTable,
    pub candidates: CurveTable,
    pub selection: SelectionResult,
}

/// All computed outputs of a single `ideal run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub training: CurveTable,
    pub candidates: CurveTable,
    pub selection: SelectionResult,
    pub test: TestPoints,
    pub records: Vec<AssignmentRecord>,
    pub summary: AssignmentSummary,
}

/// Load the training and ideal tables and run the selector.
pub fn run_select(config: &RunConfig) -> Result<SelectOutput, AppError> {
    let training = load_training_tables(&config.train_paths)?;
    let candidates = load_curve_table(&config.ideal_path)?;

    let options = SelectOptions {
        policy: config.policy,
        parallel: config.parallel,
    };
    let selection = select(&training.curves, &candidates.curves, options)?;
    for e in &selection.entries {
        log::info!(
            "{} -> {} (sse={:.6}, tolerance={:.6})",
            e.training_id,
            e.candidate_id,
            e.sse,
            e.tolerance
        );
    }

    Ok(SelectOutput {
        training,
        candidates,
        selection,
    })
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_pipeline(config: &RunConfig) -> Result<RunOutput, AppError> {
    let test_path = config
        .test_path
        .as_deref()
        .ok_or_else(|| AppError::new(2, "A test CSV is required to classify."))?;

    let SelectOutput {
        training,
        candidates,
        selection,
    } = run_select(config)?;

    let test = load_test_points(test_path)?;
    let classifier = Classifier::new(&selection, &candidates.curves, config.tolerance_factor)?;
    let mut sink = VecSink::default();
    classify_into(&classifier, &test.points, config.parallel, &mut sink)?;

    let records = sink.records;
    let summary = summarize(&records);
    log::info!(
        "classified {} points: {} assigned, {} over tolerance, {} off-grid",
        summary.total,
        summary.assigned,
        summary.tolerance_exceeded,
        summary.no_grid_match
    );

    Ok(RunOutput {
        training,
        candidates,
        selection,
        test,
        records,
        summary,
    })
}

/// Classify `points` batch by batch and hand each batch to `sink` in order.
pub fn classify_into(
    classifier: &Classifier<'_>,
    points: &[TestPoint],
    parallel: bool,
    sink: &mut impl AssignmentSink,
) -> Result<(), AppError> {
    for batch in points.chunks(CLASSIFY_BATCH) {
        let records = if parallel {
            classifier.classify_all_parallel(batch)
        } else {
            classifier.classify_all(batch)
        };
        sink.accept(&records)?;
    }
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticConfig, generate_synthetic};
    use crate::domain::{AssignmentPolicy, AssignmentStatus, DEFAULT_TOLERANCE_FACTOR};
    use crate::io::{write_curve_table_csv, write_test_points_csv};

    #[test]
    fn pipeline_runs_end_to_end_on_synthetic_files() {
        let data = generate_synthetic(&SyntheticConfig {
            seed: 3,
            tests: 300,
            ..SyntheticConfig::default()
        })
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let train = dir.path().join("train.csv");
        let ideal = dir.path().join("ideal.csv");
        let test = dir.path().join("test.csv");
        write_curve_table_csv(&train, &data.training).unwrap();
        write_curve_table_csv(&ideal, &data.candidates).unwrap();
        write_test_points_csv(&test, &data.test_points).unwrap();

        let config = RunConfig {
            train_paths: vec![train],
            ideal_path: ideal,
            test_path: Some(test),
            tolerance_factor: DEFAULT_TOLERANCE_FACTOR,
            policy: AssignmentPolicy::Shared,
            parallel: true,
            show: 0,
            quiet: true,
            export_results: None,
            export_selection: None,
        };
        let run = run_pipeline(&config).unwrap();

        let chosen: Vec<&str> = run.selection.entries.iter().map(|e| e.candidate_id.as_str()).collect();
        assert_eq!(chosen, data.planted.iter().map(String::as_str).collect::<Vec<_>>());

        assert_eq!(run.records.len(), data.test_points.len());
        for (record, point) in run.records.iter().zip(&data.test_points) {
            assert_eq!(record.point, *point);
        }
        assert!(run.summary.assigned > 0);
        for record in &run.records {
            let on_grid = data.candidates.row_of(record.point.x).is_some();
            assert_eq!(on_grid, record.status != AssignmentStatus::NoGridMatch);
        }
    }

    #[test]
    fn batches_reach_the_sink_in_order() {
        let data = generate_synthetic(&SyntheticConfig {
            tests: CLASSIFY_BATCH * 2 + 17,
            ..SyntheticConfig::default()
        })
        .unwrap();
        let selection = select(&data.training, &data.candidates, SelectOptions::default()).unwrap();
        let classifier = Classifier::new(&selection, &data.candidates, DEFAULT_TOLERANCE_FACTOR).unwrap();

        let mut par = VecSink::default();
        classify_into(&classifier, &data.test_points, true, &mut par).unwrap();
        let mut seq = VecSink::default();
        classify_into(&classifier, &data.test_points, false, &mut seq).unwrap();

        assert_eq!(par.records, seq.records);
        assert_eq!(par.records, classifier.classify_all(&data.test_points));
    }

    #[test]
    fn missing_test_path_is_a_config_error() {
        let config = RunConfig {
            train_paths: vec!["train.csv".into()],
            ideal_path: "ideal.csv".into(),
            test_path: None,
            tolerance_factor: 1.0,
            policy: AssignmentPolicy::Shared,
            parallel: false,
            show: 0,
            quiet: true,
            export_results: None,
            export_selection: None,
        };
        assert_eq!(run_pipeline(&config).unwrap_err().exit_code(), 2);
    }
}

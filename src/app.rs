//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the tolerance factor (flag, then `.env`/environment, then default)
//! - runs selection and classification
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;

use crate::classify::Classifier;
use crate::cli::{ClassifyArgs, Command, GenerateArgs, RunArgs, SelectArgs};
use crate::domain::{DEFAULT_TOLERANCE_FACTOR, RunConfig};
use crate::error::AppError;
use crate::io::{VecSink, selection_file, write_results_csv, write_selection_json};

pub mod pipeline;

/// Environment variable overriding the default tolerance factor.
pub const TOLERANCE_FACTOR_ENV: &str = "IDEAL_TOLERANCE_FACTOR";

/// Entry point for the `ideal` binary.
pub fn run() -> Result<(), AppError> {
    // `ideal -t train.csv -i ideal.csv --test test.csv` is shorthand for `ideal run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Select(args) => handle_select(args),
        Command::Classify(args) => handle_classify(args),
        Command::Generate(args) => handle_generate(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_pipeline(&config)?;

    if !config.quiet {
        println!(
            "{}",
            crate::report::format_run_header(&run.training.curves, &run.candidates.curves, &config)
        );
    }
    println!("{}", crate::report::format_selection(&run.selection, config.tolerance_factor));
    println!("{}", crate::report::format_summary(&run.summary));
    if !config.quiet && config.show > 0 {
        println!("{}", crate::report::format_assignments(&run.records, config.show));
    }

    if let Some(path) = &config.export_results {
        write_results_csv(path, &run.records)?;
    }
    if let Some(path) = &config.export_selection {
        let file = selection_file(&run.selection, config.tolerance_factor, Some(&config.ideal_path));
        write_selection_json(path, &file)?;
    }

    Ok(())
}

fn handle_select(args: SelectArgs) -> Result<(), AppError> {
    let config = select_config_from_args(&args)?;
    let out = pipeline::run_select(&config)?;

    println!(
        "{}",
        crate::report::format_run_header(&out.training.curves, &out.candidates.curves, &config)
    );
    println!("{}", crate::report::format_selection(&out.selection, config.tolerance_factor));

    if let Some(path) = &config.export_selection {
        let file = selection_file(&out.selection, config.tolerance_factor, Some(&config.ideal_path));
        write_selection_json(path, &file)?;
    }

    Ok(())
}

fn handle_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let saved = crate::io::read_selection_json(&args.selection)?;
    let tolerance_factor = match args.tolerance_factor {
        Some(factor) => validate_tolerance_factor(factor)?,
        None => validate_tolerance_factor(saved.tolerance_factor)?,
    };

    let candidates = crate::io::load_curve_table(&args.ideal)?;
    let test = crate::io::load_test_points(&args.test)?;

    let classifier = Classifier::new(&saved.selection, &candidates.curves, tolerance_factor)?;
    let mut sink = VecSink::default();
    pipeline::classify_into(&classifier, &test.points, !args.sequential, &mut sink)?;
    let summary = crate::report::summarize(&sink.records);

    println!(
        "{}",
        crate::report::format_selection(&saved.selection, classifier.tolerance_factor())
    );
    println!("{}", crate::report::format_summary(&summary));
    if args.show > 0 {
        println!("{}", crate::report::format_assignments(&sink.records, args.show));
    }

    if let Some(path) = &args.export {
        write_results_csv(path, &sink.records)?;
    }

    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = crate::data::SyntheticConfig {
        seed: args.seed,
        grid_points: args.points,
        candidates: args.candidates,
        training: args.training,
        tests: args.tests,
        noise_sd: args.noise,
        ..crate::data::SyntheticConfig::default()
    };
    let data = crate::data::generate_synthetic(&config)?;

    std::fs::create_dir_all(&args.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output directory '{}': {e}", args.out_dir.display()),
        )
    })?;
    let dir: &Path = &args.out_dir;
    crate::io::write_curve_table_csv(&dir.join("train.csv"), &data.training)?;
    crate::io::write_curve_table_csv(&dir.join("ideal.csv"), &data.candidates)?;
    crate::io::write_test_points_csv(&dir.join("test.csv"), &data.test_points)?;

    println!("Wrote train.csv, ideal.csv and test.csv to {}", dir.display());
    for (training_id, candidate_id) in data.training.ids().iter().zip(&data.planted) {
        println!("  {training_id} <- {candidate_id}");
    }
    Ok(())
}

/// Build a pipeline config for `ideal run`.
pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    let mut config = select_config_from_args(&args.select)?;
    config.test_path = Some(args.test.clone());
    config.show = args.show;
    config.quiet = args.quiet;
    config.export_results = args.export.clone();
    Ok(config)
}

/// Build a selection-only pipeline config for `ideal select`.
pub fn select_config_from_args(args: &SelectArgs) -> Result<RunConfig, AppError> {
    let env = std::env::var(TOLERANCE_FACTOR_ENV).ok();
    let tolerance_factor = resolve_tolerance_factor(args.tolerance_factor, env.as_deref())?;

    Ok(RunConfig {
        train_paths: args.train.clone(),
        ideal_path: args.ideal.clone(),
        test_path: None,
        tolerance_factor,
        policy: args.policy,
        parallel: !args.sequential,
        show: 0,
        quiet: false,
        export_results: None,
        export_selection: args.export_selection.clone(),
    })
}

/// Pick the tolerance factor: CLI flag, then the environment value, then sqrt(2).
pub fn resolve_tolerance_factor(flag: Option<f64>, env: Option<&str>) -> Result<f64, AppError> {
    if let Some(factor) = flag {
        return validate_tolerance_factor(factor);
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => {
            let factor: f64 = raw.parse().map_err(|_| {
                AppError::new(2, format!("{TOLERANCE_FACTOR_ENV} is not a number: '{raw}'"))
            })?;
            validate_tolerance_factor(factor)
        }
        None => Ok(DEFAULT_TOLERANCE_FACTOR),
    }
}

fn validate_tolerance_factor(factor: f64) -> Result<f64, AppError> {
    if factor.is_finite() && factor >= 0.0 {
        Ok(factor)
    } else {
        Err(AppError::new(
            2,
            format!("Tolerance factor must be finite and >= 0 (got {factor})."),
        ))
    }
}

/// Insert the implicit `run` subcommand.
///
/// A bare `ideal`, or one whose first argument is an input flag, is a full
/// pipeline run. Named subcommands and the top-level help/version flags are
/// left for clap.
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    const TOP_LEVEL_FLAGS: [&str; 4] = ["-h", "--help", "-V", "--version"];

    match argv.get(1) {
        None => argv.push("run".to_string()),
        Some(first) if first.starts_with('-') && !TOP_LEVEL_FLAGS.contains(&first.as_str()) => {
            argv.insert(1, "run".to_string());
        }
        Some(_) => {}
    }
    argv
}

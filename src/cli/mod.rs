//! Command-line parsing for the ideal-function matcher.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the selection/classification code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::AssignmentPolicy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ideal", version, about = "Least-squares ideal function selection and test-point mapping")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select ideal functions for the training data, then classify the test data.
    Run(RunArgs),
    /// Select ideal functions only and print/export the selection.
    Select(SelectArgs),
    /// Classify test data against a previously exported selection.
    Classify(ClassifyArgs),
    /// Write a synthetic train/ideal/test CSV set.
    Generate(GenerateArgs),
}

/// Inputs and settings shared by selection.
#[derive(Debug, Parser, Clone)]
pub struct SelectArgs {
    /// Training CSV(s) with header `x,<id>...`; several files are joined column-wise.
    #[arg(short = 't', long = "train", value_name = "CSV", required = true, num_args = 1..)]
    pub train: Vec<PathBuf>,

    /// Ideal-function catalog CSV with header `x,<id>...`.
    #[arg(short = 'i', long = "ideal", value_name = "CSV")]
    pub ideal: PathBuf,

    /// Whether one ideal function may serve several training curves.
    #[arg(long, value_enum, default_value_t = AssignmentPolicy::Shared)]
    pub policy: AssignmentPolicy,

    /// Acceptance band multiplier (default: $IDEAL_TOLERANCE_FACTOR, else sqrt(2)).
    #[arg(long)]
    pub tolerance_factor: Option<f64>,

    /// Export the selection to JSON.
    #[arg(long = "export-selection", value_name = "JSON")]
    pub export_selection: Option<PathBuf>,

    /// Disable rayon parallelism.
    #[arg(long)]
    pub sequential: bool,
}

/// Options for the full pipeline.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Test-point CSV with columns `x,y`.
    #[arg(long = "test", value_name = "CSV")]
    pub test: PathBuf,

    /// Export per-point results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Print the first N assignment rows.
    #[arg(long, default_value_t = 20)]
    pub show: usize,

    /// Only print the selection and the outcome counts.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Options for classifying against a saved selection.
#[derive(Debug, Parser, Clone)]
pub struct ClassifyArgs {
    /// Selection JSON produced by `ideal select --export-selection`.
    #[arg(long, value_name = "JSON")]
    pub selection: PathBuf,

    /// Ideal-function catalog CSV the selection was made from.
    #[arg(short = 'i', long = "ideal", value_name = "CSV")]
    pub ideal: PathBuf,

    /// Test-point CSV with columns `x,y`.
    #[arg(long = "test", value_name = "CSV")]
    pub test: PathBuf,

    /// Acceptance band multiplier (default: the factor stored in the selection file).
    #[arg(long)]
    pub tolerance_factor: Option<f64>,

    /// Export per-point results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Print the first N assignment rows.
    #[arg(long, default_value_t = 20)]
    pub show: usize,

    /// Disable rayon parallelism.
    #[arg(long)]
    pub sequential: bool,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Output directory for `train.csv`, `ideal.csv` and `test.csv`.
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Grid points per curve.
    #[arg(long, default_value_t = 400)]
    pub points: usize,

    /// Number of ideal functions in the catalog.
    #[arg(long, default_value_t = 50)]
    pub candidates: usize,

    /// Number of training curves.
    #[arg(long, default_value_t = 4)]
    pub training: usize,

    /// Number of test points.
    #[arg(long, default_value_t = 100)]
    pub tests: usize,

    /// Gaussian noise standard deviation.
    #[arg(long, default_value_t = 0.2)]
    pub noise: f64,
}

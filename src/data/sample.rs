//! Synthetic training / ideal / test data generation.
//!
//! The ideal catalog is a fixed, ordered family of analytic curves sampled on a
//! regular grid. A random subset of them is planted as training curves with
//! Gaussian noise; test points are drawn around the planted curves, with a few
//! jumps (outliers) and a few off-grid x-values so every classification outcome
//! shows up.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{CurveSet, TestPoint};
use crate::error::AppError;

/// Number of distinct shapes in the ideal catalog before scales repeat.
const FAMILIES: usize = 8;

/// Grid coordinates are rounded to this many decimals so CSV output stays short.
const GRID_DECIMALS: i32 = 10;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub grid_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub candidates: usize,
    pub training: usize,
    pub tests: usize,
    /// Standard deviation of the Gaussian noise added to planted curves.
    pub noise_sd: f64,
    /// Probability that a test point gets a jump of `jump_k * noise_sd`.
    pub jump_prob: f64,
    pub jump_k: f64,
    /// Probability that a test point is moved off the grid.
    pub off_grid_prob: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            grid_points: 400,
            x_min: -20.0,
            x_max: 20.0,
            candidates: 50,
            training: 4,
            tests: 100,
            noise_sd: 0.2,
            jump_prob: 0.05,
            jump_k: 12.0,
            off_grid_prob: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub training: CurveSet,
    pub candidates: CurveSet,
    pub test_points: Vec<TestPoint>,
    /// Candidate id planted behind each training curve, in training order.
    pub planted: Vec<String>,
}

/// Value of catalog curve `k` at `x`.
///
/// Shapes cycle through `FAMILIES`; each full cycle scales the shape by a
/// further 0.5 so no two catalog entries coincide.
pub fn ideal_function(k: usize, x: f64) -> f64 {
    let scale = 1.0 + 0.5 * (k / FAMILIES) as f64;
    let base = match k % FAMILIES {
        0 => x,
        1 => x * x / 10.0,
        2 => x * x * x / 100.0,
        3 => x.sin(),
        4 => x.cos(),
        5 => (x / 4.0).tanh(),
        6 => x.abs().sqrt(),
        _ => (x / 10.0).exp(),
    };
    scale * base
}

/// Half-open regular grid `[x_min, x_max)` with `n` points.
pub fn regular_grid(x_min: f64, x_max: f64, n: usize) -> Vec<f64> {
    let step = (x_max - x_min) / n as f64;
    let factor = 10f64.powi(GRID_DECIMALS);
    (0..n)
        .map(|i| ((x_min + i as f64 * step) * factor).round() / factor)
        .collect()
}

pub fn generate_synthetic(config: &SyntheticConfig) -> Result<SyntheticData, AppError> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise_sd)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let grid = regular_grid(config.x_min, config.x_max, config.grid_points);
    let step = (config.x_max - config.x_min) / config.grid_points as f64;

    let catalog: Vec<(String, Vec<f64>)> = (0..config.candidates)
        .map(|k| {
            let ys = grid.iter().map(|&x| ideal_function(k, x)).collect();
            (format!("y{}", k + 1), ys)
        })
        .collect();

    let planted_idx = rand::seq::index::sample(&mut rng, config.candidates, config.training).into_vec();

    let training_columns: Vec<(String, Vec<f64>)> = planted_idx
        .iter()
        .enumerate()
        .map(|(t, &k)| {
            let ys = catalog[k]
                .1
                .iter()
                .map(|&y| y + normal.sample(&mut rng))
                .collect();
            (format!("y{}", t + 1), ys)
        })
        .collect();

    let mut test_points = Vec::with_capacity(config.tests);
    for _ in 0..config.tests {
        let row = rng.gen_range(0..grid.len());
        let k = planted_idx[rng.gen_range(0..planted_idx.len())];
        let jump = sample_jump(&mut rng, config.jump_prob, config.jump_k);

        let mut x = grid[row];
        if rng.gen_bool(config.off_grid_prob) {
            x += step / 2.0;
        }
        let y = ideal_function(k, x) + normal.sample(&mut rng) + jump * config.noise_sd;
        test_points.push(TestPoint::new(x, y));
    }

    let planted = planted_idx.iter().map(|&k| catalog[k].0.clone()).collect();
    let training = CurveSet::new(grid.clone(), training_columns)?;
    let candidates = CurveSet::new(grid, catalog)?;

    log::debug!(
        "generated {} training curves, {} candidates, {} test points (seed {})",
        training.len(),
        candidates.len(),
        test_points.len(),
        config.seed
    );

    Ok(SyntheticData {
        training,
        candidates,
        test_points,
        planted,
    })
}

fn validate(config: &SyntheticConfig) -> Result<(), AppError> {
    if config.grid_points == 0 {
        return Err(AppError::new(2, "Grid point count must be > 0."));
    }
    if !(config.x_min.is_finite() && config.x_max.is_finite() && config.x_max > config.x_min) {
        return Err(AppError::new(2, "Invalid x range for synthetic data."));
    }
    if config.training == 0 || config.candidates < config.training {
        return Err(AppError::new(
            2,
            "Need at least one training curve and no more training curves than candidates.",
        ));
    }
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(AppError::new(2, "Invalid noise standard deviation."));
    }
    for p in [config.jump_prob, config.off_grid_prob] {
        if !(0.0..=1.0).contains(&p) {
            return Err(AppError::new(2, "Probabilities must lie in [0, 1]."));
        }
    }
    if !(config.jump_k.is_finite() && config.jump_k >= 0.0) {
        return Err(AppError::new(2, "Invalid jump magnitude."));
    }
    Ok(())
}

/// Symmetric jump: `±k` with total probability `p`, else 0.
fn sample_jump(rng: &mut StdRng, p: f64, k: f64) -> f64 {
    let roll: f64 = rng.r#gen();
    if roll < p / 2.0 {
        k
    } else if roll < p {
        -k
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{SelectOptions, select};

    #[test]
    fn same_seed_same_data() {
        let config = SyntheticConfig {
            tests: 20,
            ..SyntheticConfig::default()
        };
        let a = generate_synthetic(&config).unwrap();
        let b = generate_synthetic(&config).unwrap();
        assert_eq!(a.planted, b.planted);
        assert_eq!(a.test_points, b.test_points);
        assert_eq!(a.training.column(0), b.training.column(0));
    }

    #[test]
    fn grid_is_short_decimal() {
        let grid = regular_grid(-20.0, 20.0, 400);
        assert_eq!(grid.len(), 400);
        assert_eq!(grid[0], -20.0);
        assert_eq!(grid[1], -19.9);
        assert_eq!(grid[399], 19.9);
    }

    #[test]
    fn catalog_entries_are_distinct() {
        let grid = regular_grid(-20.0, 20.0, 40);
        let curves: Vec<Vec<f64>> = (0..24)
            .map(|k| grid.iter().map(|&x| ideal_function(k, x)).collect())
            .collect();
        for i in 0..curves.len() {
            for j in (i + 1)..curves.len() {
                assert_ne!(curves[i], curves[j], "catalog {i} == {j}");
            }
        }
    }

    #[test]
    fn selection_recovers_planted_candidates() {
        for seed in [1, 7, 42] {
            let config = SyntheticConfig {
                seed,
                ..SyntheticConfig::default()
            };
            let data = generate_synthetic(&config).unwrap();
            let result = select(&data.training, &data.candidates, SelectOptions::default()).unwrap();
            let chosen: Vec<String> = result.entries.iter().map(|e| e.candidate_id.clone()).collect();
            assert_eq!(chosen, data.planted, "seed {seed}");
        }
    }

    #[test]
    fn rejects_more_training_than_candidates() {
        let config = SyntheticConfig {
            candidates: 3,
            training: 4,
            ..SyntheticConfig::default()
        };
        assert_eq!(generate_synthetic(&config).unwrap_err().exit_code(), 2);
    }
}

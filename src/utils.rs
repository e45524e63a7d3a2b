//! Utility functions for toy data and training summaries.
use crate::error::{NetworkError, Result};
use ndarray::Array2;
use rand::Rng;

/// Distance from the decision boundary below which sampled points are
/// thrown away, keeping the two classes apart.
const MARGIN: f64 = 0.1;

/// Generate a linearly separable binary dataset.
///
/// Returns `x` of shape `(nx, m)` with features in `[-1, 1)` and `y` of
/// shape `(1, m)`, where a column is labelled 1 iff its features sum to a
/// positive value. `nx` must be at least 1: with no features every column
/// would sit on the boundary.
pub fn generate_separable_data<R: Rng>(
    m: usize,
    nx: usize,
    rng: &mut R,
) -> Result<(Array2<f64>, Array2<f64>)> {
    if nx < 1 {
        return Err(NetworkError::invalid("nx must be a positive integer"));
    }
    let mut x = Array2::zeros((nx, m));
    let mut y = Array2::zeros((1, m));
    for j in 0..m {
        let (column, sum) = loop {
            let column: Vec<f64> = (0..nx).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let sum: f64 = column.iter().sum();
            if sum.abs() >= MARGIN {
                break (column, sum);
            }
        };
        for (i, v) in column.into_iter().enumerate() {
            x[[i, j]] = v;
        }
        y[[0, j]] = if sum > 0.0 { 1.0 } else { 0.0 };
    }
    Ok((x, y))
}

/// Print simple table for sampled training costs
pub fn print_summary_table(samples: &[(usize, f64)], title: &str) {
    println!("\n{} Summary Table:", title);
    println!("+------------+--------------+");
    println!("| Iteration  | Cost         |");
    println!("+------------+--------------+");
    for &(i, cost) in samples {
        println!("| {:>10} | {:>12.6} |", i, cost);
    }
    println!("+------------+--------------+");
}

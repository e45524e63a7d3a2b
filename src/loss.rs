//! Cost functions for training the network.
use crate::error::{NetworkError, Result};
use crate::layers::DenseLayer;
use ndarray::Array2;

/// Stand-in for `1` in the `log(1 - A)` term, so a saturated `A == 1`
/// costs `-log(1e-7)` instead of `-log(0)`.
pub const LOG_ONE: f64 = 1.0000001;

/// Logistic (binary cross-entropy) cost averaged over the `m` examples:
///
/// `-(1/m) * Σ [Y·log(A) + (1 - Y)·log(1.0000001 - A)]`
///
/// NaN/Inf are not guarded beyond the fixed [`LOG_ONE`] substitute.
pub fn binary_cross_entropy(y: &Array2<f64>, a: &Array2<f64>) -> Result<f64> {
    if y.dim() != a.dim() {
        return Err(NetworkError::invalid(format!(
            "labels {:?} and activations {:?} differ in shape",
            y.dim(),
            a.dim()
        )));
    }
    let m = y.ncols() as f64;
    let total: f64 = y
        .iter()
        .zip(a.iter())
        .map(|(&yi, &ai)| yi * ai.ln() + (1.0 - yi) * (LOG_ONE - ai).ln())
        .sum();
    Ok(-total / m)
}

/// Adds the L2 penalty `lambda / (2m) * Σ ||W_i||²` (squared Frobenius norms
/// of every weight matrix; biases are not penalised) to `cost`.
pub fn l2_reg_cost(cost: f64, lambda: f64, layers: &[DenseLayer], m: usize) -> f64 {
    let squared: f64 = layers
        .iter()
        .map(|layer| layer.weights().iter().map(|w| w * w).sum::<f64>())
        .sum();
    cost + lambda / (2.0 * m as f64) * squared
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn epsilon_constant_is_exact() {
        // Y = 0 with A at the smallest positive value isolates the log(LOG_ONE - A) term.
        let cost = binary_cross_entropy(&array![[0.0]], &array![[f64::MIN_POSITIVE]]).unwrap();
        assert_eq!(cost, -(1.0000001f64).ln());
        assert_abs_diff_eq!(cost, -9.9999995e-8, epsilon = 1e-14);
    }

    #[test]
    fn saturated_wrong_prediction_stays_finite() {
        let cost = binary_cross_entropy(&array![[0.0]], &array![[1.0]]).unwrap();
        assert!(cost.is_finite());
        assert_eq!(cost, -(LOG_ONE - 1.0).ln());
        assert!(cost > 16.0 && cost < 16.2);
    }

    #[test]
    fn perfect_positive_prediction_costs_nothing() {
        let cost = binary_cross_entropy(&array![[1.0]], &array![[1.0]]).unwrap();
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn averages_over_examples() {
        let y = array![[1.0, 0.0]];
        let a = array![[0.5, 0.5]];
        let cost = binary_cross_entropy(&y, &a).unwrap();
        let expected = -(0.5f64.ln() + (LOG_ONE - 0.5).ln()) / 2.0;
        assert_abs_diff_eq!(cost, expected, epsilon = 1e-15);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = binary_cross_entropy(&array![[1.0, 0.0]], &array![[1.0]]).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidArgument(_)));
    }

    #[test]
    fn l2_penalty_sums_squared_weights() {
        let layers = vec![
            DenseLayer::from_parts(array![[1.0, 2.0], [0.0, -1.0]], array![[9.0], [9.0]]),
            DenseLayer::from_parts(array![[3.0, 0.0]], array![[9.0]]),
        ];
        // (1 + 4 + 0 + 1) + 9 = 15; 0.4 / (2 * 3) * 15 = 1.0
        let reg = l2_reg_cost(0.5, 0.4, &layers, 3);
        assert_abs_diff_eq!(reg, 1.5, epsilon = 1e-12);
        assert_eq!(l2_reg_cost(0.5, 0.0, &layers, 3), 0.5);
    }
}

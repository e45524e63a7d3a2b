//! Element-wise activation functions.
use ndarray::Array2;
use std::fmt;

/// Trait for activation functions.
///
/// `derivative` is expressed in terms of the activation's *output*, which is
/// what the forward cache keeps around.
pub trait Activation: fmt::Debug + Send + Sync {
    fn apply(&self, x: f64) -> f64;
    fn derivative(&self, a: f64) -> f64;
    fn apply_array(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|zi| self.apply(zi))
    }
    fn derivative_array(&self, a: &Array2<f64>) -> Array2<f64> {
        a.mapv(|ai| self.derivative(ai))
    }
}

/// Sigmoid: 1 / (1 + exp(-x))
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    fn apply(&self, x: f64) -> f64 {
        // Only ever exponentiate a non-positive number so exp cannot overflow.
        if x >= 0.0 {
            1.0 / (1.0 + (-x).exp())
        } else {
            let e = x.exp();
            e / (1.0 + e)
        }
    }

    fn derivative(&self, a: f64) -> f64 {
        a * (1.0 - a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn sigmoid_midpoint_and_symmetry() {
        assert_eq!(Sigmoid.apply(0.0), 0.5);
        for &x in &[0.3, 1.7, 5.0, 12.0] {
            assert_abs_diff_eq!(Sigmoid.apply(x) + Sigmoid.apply(-x), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn sigmoid_saturates_without_overflow() {
        let hi = Sigmoid.apply(1.0e4);
        let lo = Sigmoid.apply(-1.0e4);
        assert!(hi.is_finite() && lo.is_finite());
        assert_eq!(hi, 1.0);
        assert_eq!(lo, 0.0);
        assert!(Sigmoid.apply(-745.0) >= 0.0);
    }

    #[test]
    fn derivative_uses_activated_output() {
        assert_eq!(Sigmoid.derivative(0.5), 0.25);
        assert_eq!(Sigmoid.derivative(1.0), 0.0);
        let a = array![[0.5, 0.25], [0.75, 0.0]];
        let d = Sigmoid.derivative_array(&a);
        assert_eq!(d, array![[0.25, 0.1875], [0.1875, 0.0]]);
    }

    #[test]
    fn apply_array_is_elementwise() {
        let z = array![[0.0, 2.0], [-2.0, 0.0]];
        let a = Sigmoid.apply_array(&z);
        assert_eq!(a.dim(), (2, 2));
        assert_eq!(a[[0, 0]], 0.5);
        assert_abs_diff_eq!(a[[0, 1]], 1.0 / (1.0 + (-2.0f64).exp()), epsilon = 1e-15);
        assert_abs_diff_eq!(a[[1, 0]] + a[[0, 1]], 1.0, epsilon = 1e-12);
    }
}

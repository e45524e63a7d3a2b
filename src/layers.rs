//! Dense layer parameters: a weight matrix and a bias column, sigmoid activated.
use crate::activations::{Activation, Sigmoid};
use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;

/// A fully-connected sigmoid layer.
///
/// `weights` has shape `(output_size, input_size)` and `bias` has shape
/// `(output_size, 1)`. The shapes are fixed once the layer exists; only the
/// values move, and only through [`DenseLayer::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    weights: Array2<f64>,
    bias: Array2<f64>,
}

impl DenseLayer {
    /// Create a new dense layer using He normal initialization and zero bias.
    pub fn new<R: Rng>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        // He normal: N(0, 2 / fan_in)
        let scale = (2.0 / input_size as f64).sqrt();
        let weights = Array2::from_shape_simple_fn((output_size, input_size), || {
            rng.sample::<f64, _>(StandardNormal) * scale
        });
        let bias = Array2::zeros((output_size, 1));
        Self { weights, bias }
    }

    /// Wrap existing parameters. The caller checks the shapes.
    pub(crate) fn from_parts(weights: Array2<f64>, bias: Array2<f64>) -> Self {
        Self { weights, bias }
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array2<f64> {
        &self.bias
    }

    pub fn input_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn output_size(&self) -> usize {
        self.weights.nrows()
    }

    /// Forward pass: `a = sigmoid(W·a_prev + b)`, with `b` broadcast over the batch.
    pub fn forward(&self, a_prev: &Array2<f64>) -> Array2<f64> {
        let z = self.weights.dot(a_prev) + &self.bias;
        Sigmoid.apply_array(&z)
    }

    /// Parameter update: `W -= alpha * dw`, `b -= alpha * db`.
    pub(crate) fn update(&mut self, dw: &Array2<f64>, db: &Array2<f64>, alpha: f64) {
        self.weights.scaled_add(-alpha, dw);
        self.bias.scaled_add(-alpha, db);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn he_init_shapes_and_zero_bias() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = DenseLayer::new(3, 5, &mut rng);
        assert_eq!(layer.weights().dim(), (5, 3));
        assert_eq!(layer.bias().dim(), (5, 1));
        assert_eq!(layer.input_size(), 3);
        assert_eq!(layer.output_size(), 5);
        assert!(layer.bias().iter().all(|&b| b == 0.0));
        assert!(layer.weights().iter().any(|&w| w != 0.0));
    }

    #[test]
    fn he_init_variance_tracks_fan_in() {
        let mut rng = StdRng::seed_from_u64(42);
        let fan_in = 50;
        let layer = DenseLayer::new(fan_in, 400, &mut rng);
        let n = layer.weights().len() as f64;
        let mean = layer.weights().sum() / n;
        let var = layer.weights().mapv(|w| (w - mean).powi(2)).sum() / n;
        let expected = 2.0 / fan_in as f64;
        assert!(mean.abs() < 0.01, "mean {mean}");
        assert!((var - expected).abs() < 0.1 * expected, "var {var} vs {expected}");
    }

    #[test]
    fn forward_broadcasts_bias_over_examples() {
        let layer = DenseLayer::from_parts(array![[0.0, 0.0]], array![[0.0]]);
        let out = layer.forward(&array![[1.0, -3.0, 9.0], [2.0, 4.0, -8.0]]);
        assert_eq!(out, array![[0.5, 0.5, 0.5]]);
    }

    #[test]
    fn update_subtracts_scaled_deltas() {
        let mut layer = DenseLayer::from_parts(array![[1.0, 2.0]], array![[0.5]]);
        layer.update(&array![[1.0, -1.0]], &array![[2.0]], 0.25);
        assert_eq!(layer.weights(), &array![[0.75, 2.25]]);
        assert_eq!(layer.bias(), &array![[0.0]]);
    }
}

//! A minimal deep neural network crate for educational purposes: binary
//! classification with stacked sigmoid layers trained by batch gradient descent.
//!
//! - `DeepNetwork` with He-initialised dense layers, forward cache, and backpropagation
//! - Logistic cost with the fixed `1.0000001` log safeguard, plus an L2 penalty
//! - JSON training config, cost reporting through a caller-supplied sink
//! - Gzipped JSON snapshots (`.pere`)
//! - Toy data and summary helpers

pub mod activations;
pub mod config;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod utils;

pub use activations::{Activation, Sigmoid};
pub use config::{load_config, TrainingConfig};
pub use error::{NetworkError, Result};
pub use layers::DenseLayer;
pub use loss::{binary_cross_entropy, l2_reg_cost, LOG_ONE};
pub use metrics::{accuracy, confusion_matrix};
pub use network::{Cache, DeepNetwork, Gradients};
pub use utils::{generate_separable_data, print_summary_table};

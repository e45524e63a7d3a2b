//! Deep binary classifier built from sigmoid dense layers, with batch
//! gradient descent training and snapshot persistence.
use crate::activations::{Activation, Sigmoid};
use crate::config::TrainingConfig;
use crate::error::{NetworkError, Result};
use crate::layers::DenseLayer;
use crate::loss::binary_cross_entropy;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::ops::Index;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Activations of every layer from the most recent forward pass.
///
/// Entry `0` is the input batch, entry `i` the output of layer `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cache {
    activations: Vec<Array2<f64>>,
}

impl Cache {
    pub fn len(&self) -> usize {
        self.activations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Array2<f64>> {
        self.activations.get(i)
    }

    /// Final layer activation, if a forward pass has run.
    pub fn output(&self) -> Option<&Array2<f64>> {
        self.activations.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Array2<f64>> {
        self.activations.iter()
    }
}

impl Index<usize> for Cache {
    type Output = Array2<f64>;

    fn index(&self, i: usize) -> &Array2<f64> {
        &self.activations[i]
    }
}

/// Gradients for all layers in order
#[derive(Debug, Clone)]
pub struct Gradients {
    d_w: Vec<Array2<f64>>,
    db: Vec<Array2<f64>>,
}

impl Gradients {
    pub fn len(&self) -> usize {
        self.d_w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.d_w.is_empty()
    }

    /// Weight gradient of layer `i`, counting from 1.
    pub fn d_w(&self, i: usize) -> Option<&Array2<f64>> {
        i.checked_sub(1).and_then(|idx| self.d_w.get(idx))
    }

    /// Bias gradient of layer `i`, counting from 1.
    pub fn db(&self, i: usize) -> Option<&Array2<f64>> {
        i.checked_sub(1).and_then(|idx| self.db.get(idx))
    }
}

/// A deep neural network performing binary classification.
///
/// Layers are addressed `1..=L`; layer 0 is the input. Every layer is a
/// sigmoid dense layer. An instance is not meant to be shared across
/// threads while training: use one network per trainer.
#[derive(Debug, Clone)]
pub struct DeepNetwork {
    layers: Vec<DenseLayer>,
    input_size: usize,
    cache: Cache,
}

impl DeepNetwork {
    /// Create a network with `nx` input features and one layer per entry of
    /// `layer_sizes`, He-initialised from the thread RNG.
    pub fn new(nx: usize, layer_sizes: &[usize]) -> Result<Self> {
        Self::with_rng(nx, layer_sizes, &mut rand::thread_rng())
    }

    /// Same as [`DeepNetwork::new`] with a caller-supplied RNG.
    pub fn with_rng<R: Rng>(nx: usize, layer_sizes: &[usize], rng: &mut R) -> Result<Self> {
        if nx < 1 {
            return Err(NetworkError::invalid("nx must be a positive integer"));
        }
        if layer_sizes.is_empty() || layer_sizes.contains(&0) {
            return Err(NetworkError::invalid("layers must be a list of positive integers"));
        }
        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut prev_size = nx;
        for &size in layer_sizes {
            layers.push(DenseLayer::new(prev_size, size, rng));
            prev_size = size;
        }
        Ok(Self {
            layers,
            input_size: nx,
            cache: Cache::default(),
        })
    }

    /// A single sigmoid neuron (logistic regression).
    ///
    /// Weights are He-scaled like every other layer here, not plain `N(0, 1)`.
    pub fn neuron(nx: usize) -> Result<Self> {
        Self::new(nx, &[1])
    }

    /// One hidden layer of `nodes` units feeding a single output neuron,
    /// He-scaled like [`DeepNetwork::neuron`].
    pub fn shallow(nx: usize, nodes: usize) -> Result<Self> {
        Self::new(nx, &[nodes, 1])
    }

    /// Build a network from explicit `(weights, bias)` pairs, ordered from
    /// the first layer to the output layer.
    pub fn from_parameters(nx: usize, parameters: Vec<(Array2<f64>, Array2<f64>)>) -> Result<Self> {
        if nx < 1 {
            return Err(NetworkError::invalid("nx must be a positive integer"));
        }
        if parameters.is_empty() {
            return Err(NetworkError::invalid("layers must be a list of positive integers"));
        }
        let mut prev_size = nx;
        let mut layers = Vec::with_capacity(parameters.len());
        for (i, (weights, bias)) in parameters.into_iter().enumerate() {
            let rows = weights.nrows();
            if rows == 0 || weights.ncols() != prev_size || bias.dim() != (rows, 1) {
                return Err(NetworkError::invalid(format!(
                    "layer {}: weights {:?} and bias {:?} do not fit an input of {}",
                    i + 1,
                    weights.dim(),
                    bias.dim(),
                    prev_size
                )));
            }
            layers.push(DenseLayer::from_parts(weights, bias));
            prev_size = rows;
        }
        Ok(Self {
            layers,
            input_size: nx,
            cache: Cache::default(),
        })
    }

    /// Number of layers `L`.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Layer `i`, counting from 1.
    pub fn layer(&self, i: usize) -> Option<&DenseLayer> {
        i.checked_sub(1).and_then(|idx| self.layers.get(idx))
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if x.nrows() != self.input_size || x.ncols() == 0 {
            return Err(NetworkError::invalid(format!(
                "input must have shape ({}, m) with m >= 1, got {:?}",
                self.input_size,
                x.dim()
            )));
        }
        Ok(())
    }

    fn check_labels(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
        self.check_input(x)?;
        let expected = (self.output_size(), x.ncols());
        if y.dim() != expected {
            return Err(NetworkError::invalid(format!(
                "labels must have shape {:?}, got {:?}",
                expected,
                y.dim()
            )));
        }
        Ok(())
    }

    /// Forward propagation. Rebuilds the whole cache and returns `A_L`.
    pub fn forward(&mut self, x: &Array2<f64>) -> Result<&Array2<f64>> {
        self.check_input(x)?;
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(x.clone());
        for layer in &self.layers {
            let a = layer.forward(&activations[activations.len() - 1]);
            activations.push(a);
        }
        self.cache = Cache { activations };
        Ok(&self.cache[self.layers.len()])
    }

    /// Logistic cost of activations `a` against labels `y`.
    pub fn cost(&self, y: &Array2<f64>, a: &Array2<f64>) -> Result<f64> {
        binary_cross_entropy(y, a)
    }

    /// Runs a forward pass and returns the thresholded predictions
    /// (`1.0` where `A >= 0.5`, else `0.0`) with the cost.
    pub fn evaluate(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(Array2<f64>, f64)> {
        self.check_labels(x, y)?;
        let a = self.forward(x)?;
        let cost = binary_cross_entropy(y, a)?;
        let prediction = a.mapv(|ai| if ai >= 0.5 { 1.0 } else { 0.0 });
        Ok((prediction, cost))
    }

    /// Backpropagation over a forward cache. Nothing is modified.
    pub fn compute_gradients(&self, y: &Array2<f64>, cache: &Cache) -> Result<Gradients> {
        let l = self.layers.len();
        if cache.len() != l + 1 {
            return Err(NetworkError::invalid(format!(
                "cache holds {} activations, expected {}",
                cache.len(),
                l + 1
            )));
        }
        let m = y.ncols();
        for (i, a) in cache.iter().enumerate() {
            let rows = if i == 0 {
                self.input_size
            } else {
                self.layers[i - 1].output_size()
            };
            if a.dim() != (rows, m) {
                return Err(NetworkError::invalid(format!(
                    "cache entry {} has shape {:?}, expected {:?}",
                    i,
                    a.dim(),
                    (rows, m)
                )));
            }
        }
        if m == 0 || y.nrows() != self.output_size() {
            return Err(NetworkError::invalid(format!("labels have shape {:?}", y.dim())));
        }

        let m = m as f64;
        let mut d_w = Vec::with_capacity(l);
        let mut db = Vec::with_capacity(l);
        // Output layer: derivative of sigmoid + cross-entropy combined.
        let mut dz = &cache[l] - y;
        let mut i = l;
        loop {
            let (layer_dw, layer_db, upstream) = self.backward_step(i, &dz, cache, m);
            d_w.push(layer_dw);
            db.push(layer_db);
            match upstream {
                Some(next) => {
                    dz = next;
                    i -= 1;
                }
                None => break,
            }
        }
        d_w.reverse();
        db.reverse();
        Ok(Gradients { d_w, db })
    }

    /// Gradients of layer `i` from its error term `dz`, plus the error term
    /// of layer `i - 1`. The first layer has nothing below it and yields `None`.
    fn backward_step(
        &self,
        i: usize,
        dz: &Array2<f64>,
        cache: &Cache,
        m: f64,
    ) -> (Array2<f64>, Array2<f64>, Option<Array2<f64>>) {
        let a_prev = &cache[i - 1];
        let d_w = dz.dot(&a_prev.t()) / m;
        let db = dz.sum_axis(Axis(1)).insert_axis(Axis(1)) / m;
        let upstream = (i > 1).then(|| {
            let da = self.layers[i - 1].weights().t().dot(dz);
            da * &Sigmoid.derivative_array(a_prev)
        });
        (d_w, db, upstream)
    }

    /// Applies `W_i -= alpha * dW_i` and `b_i -= alpha * db_i` to every layer.
    pub fn apply_gradients(&mut self, grads: &Gradients, alpha: f64) -> Result<()> {
        let fits = grads.len() == self.layers.len()
            && self.layers.iter().enumerate().all(|(i, layer)| {
                grads.d_w[i].dim() == layer.weights().dim() && grads.db[i].dim() == layer.bias().dim()
            });
        if !fits {
            return Err(NetworkError::invalid("gradients do not match the network's layers"));
        }
        for (layer, (d_w, db)) in self.layers.iter_mut().zip(grads.d_w.iter().zip(grads.db.iter())) {
            layer.update(d_w, db, alpha);
        }
        Ok(())
    }

    /// One pass of gradient descent over `cache` with learning rate `alpha`.
    pub fn gradient_descent(&mut self, y: &Array2<f64>, cache: &Cache, alpha: f64) -> Result<()> {
        let grads = self.compute_gradients(y, cache)?;
        self.apply_gradients(&grads, alpha)
    }

    /// Trains on the whole batch `(x, y)` and returns the final
    /// [`evaluate`](Self::evaluate) result.
    pub fn train(
        &mut self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        config: &TrainingConfig,
    ) -> Result<(Array2<f64>, f64)> {
        self.train_with_sink(x, y, config, |_, _| {})
    }

    /// Like [`train`](Self::train), handing `(iteration, cost)` samples to `sink`.
    ///
    /// When `config.verbose` or `config.graph` is set, a sample is taken at
    /// every iteration `i < iterations` with `i % step == 0` (the cost seen
    /// before update `i`), followed by one final sample at
    /// `i == iterations` with the cost after training. `verbose` also logs
    /// each sample.
    pub fn train_with_sink<F>(
        &mut self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        config: &TrainingConfig,
        mut sink: F,
    ) -> Result<(Array2<f64>, f64)>
    where
        F: FnMut(usize, f64),
    {
        config.validate()?;
        self.check_labels(x, y)?;
        debug!(
            "Training {} for {} iterations (alpha = {})",
            self, config.iterations, config.alpha
        );

        let mut report = |i: usize, cost: f64| {
            if config.verbose {
                info!("Cost after {} iterations: {}", i, cost);
            }
            sink(i, cost);
        };

        for i in 0..config.iterations {
            let a = self.forward(x)?;
            if config.reporting() && i % config.step == 0 {
                let cost = binary_cross_entropy(y, a)?;
                report(i, cost);
            }
            let grads = self.compute_gradients(y, &self.cache)?;
            self.apply_gradients(&grads, config.alpha)?;
        }

        let (prediction, cost) = self.evaluate(x, y)?;
        if config.reporting() {
            report(config.iterations, cost);
        }
        debug!("Training finished with cost {}", cost);
        Ok((prediction, cost))
    }

    /// Serialises the layer count and every parameter into a gzipped JSON blob.
    pub fn save(&self) -> Result<Vec<u8>> {
        let dto = NetworkDto::from_network(self)?;
        let json = serde_json::to_vec(&dto)
            .map_err(|e| NetworkError::invalid(format!("cannot serialise network: {}", e)))?;
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&json)?;
        let blob = enc.finish()?;
        debug!("Saved {} ({} bytes)", self, blob.len());
        Ok(blob)
    }

    /// Rebuilds a network from a [`save`](Self::save) blob. Anything that is
    /// not a well-formed snapshot yields [`NetworkError::NotFound`].
    pub fn load(blob: &[u8]) -> Result<Self> {
        let mut json = Vec::new();
        GzDecoder::new(blob)
            .read_to_end(&mut json)
            .map_err(|e| NetworkError::not_found(format!("snapshot is not gzip data: {}", e)))?;
        let dto: NetworkDto = serde_json::from_slice(&json)
            .map_err(|e| NetworkError::not_found(format!("snapshot is malformed: {}", e)))?;
        let network = dto.into_network()?;
        debug!("Loaded {}", network);
        Ok(network)
    }

    /// Save model to a `.pere` file, appending the extension when missing.
    /// Returns the path actually written.
    pub fn save_pere(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let mut path = path.as_ref().to_path_buf();
        if path.extension().map_or(true, |ext| ext != "pere") {
            let mut name = path.clone().into_os_string();
            name.push(".pere");
            path = PathBuf::from(name);
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, self.save()?)?;
        Ok(path)
    }

    /// Load model from a `.pere` file. A missing or unreadable file is
    /// [`NetworkError::NotFound`], as is a corrupt one.
    pub fn load_pere(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let blob = fs::read(path)
            .map_err(|e| NetworkError::not_found(format!("{}: {}", path.display(), e)))?;
        Self::load(&blob)
    }
}

impl fmt::Display for DeepNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sizes = vec![self.input_size];
        sizes.extend(self.layers.iter().map(DenseLayer::output_size));
        write!(f, "DeepNetwork: {:?}", sizes)
    }
}

// ============ Persistence DTOs ============

#[derive(Debug, Serialize, Deserialize)]
struct LayerDto {
    rows: usize,
    cols: usize,
    weights: Vec<f64>, // row-major [rows][cols]
    bias: Vec<f64>,    // [rows]
}

#[derive(Debug, Serialize, Deserialize)]
struct NetworkDto {
    input_size: usize,
    layer_count: usize,
    layers: Vec<LayerDto>,
}

impl NetworkDto {
    fn from_network(network: &DeepNetwork) -> Result<Self> {
        let mut layers = Vec::with_capacity(network.layers.len());
        for (i, layer) in network.layers.iter().enumerate() {
            let finite = layer.weights().iter().chain(layer.bias().iter()).all(|v| v.is_finite());
            if !finite {
                return Err(NetworkError::invalid(format!(
                    "layer {} holds non-finite parameters",
                    i + 1
                )));
            }
            layers.push(LayerDto {
                rows: layer.output_size(),
                cols: layer.input_size(),
                weights: layer.weights().iter().copied().collect(),
                bias: layer.bias().iter().copied().collect(),
            });
        }
        Ok(Self {
            input_size: network.input_size,
            layer_count: network.layers.len(),
            layers,
        })
    }

    fn into_network(self) -> Result<DeepNetwork> {
        if self.layer_count != self.layers.len() {
            return Err(NetworkError::not_found(format!(
                "snapshot declares {} layers but holds {}",
                self.layer_count,
                self.layers.len()
            )));
        }
        let mut parameters = Vec::with_capacity(self.layers.len());
        for ld in self.layers {
            let rows = ld.rows;
            let weights = Array2::from_shape_vec((rows, ld.cols), ld.weights)
                .map_err(|e| NetworkError::not_found(format!("snapshot weights: {}", e)))?;
            let bias = Array2::from_shape_vec((ld.bias.len(), 1), ld.bias)
                .map_err(|e| NetworkError::not_found(format!("snapshot bias: {}", e)))?;
            parameters.push((weights, bias));
        }
        DeepNetwork::from_parameters(self.input_size, parameters).map_err(|e| match e {
            NetworkError::InvalidArgument(msg) => NetworkError::not_found(msg),
            other => other,
        })
    }
}

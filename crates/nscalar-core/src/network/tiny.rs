//! Dense feed-forward network with seeded initialization.

use super::{Network, activate};
use crate::primitives::DEFAULT_SEED;
use crate::scalar::Scalar;
use crate::types::{Activation, Initialization, ScalarError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

// =============================================================================
// LAYER
// =============================================================================

/// A fully connected layer. Weights are row-major, one row per output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub activation: Activation,
    pub inputs: usize,
    pub outputs: usize,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl DenseLayer {
    /// Create a zero-initialized layer.
    #[must_use]
    pub fn zeroed(activation: Activation, inputs: usize, outputs: usize) -> Self {
        Self {
            activation,
            inputs,
            outputs,
            weights: vec![0.0; inputs.saturating_mul(outputs)],
            biases: vec![0.0; outputs],
        }
    }

    /// Check that the parameter buffers match the declared shape.
    pub fn validate(&self) -> Result<(), ScalarError> {
        let expected = self.inputs.checked_mul(self.outputs).ok_or_else(|| {
            ScalarError::InvariantViolation(format!(
                "layer shape {}x{} overflows",
                self.outputs, self.inputs
            ))
        })?;
        if self.weights.len() != expected {
            return Err(ScalarError::DimensionMismatch {
                expected,
                actual: self.weights.len(),
            });
        }
        if self.biases.len() != self.outputs {
            return Err(ScalarError::DimensionMismatch {
                expected: self.outputs,
                actual: self.biases.len(),
            });
        }
        Ok(())
    }

    /// Change the number of inputs, keeping the weights of surviving columns.
    fn resize_inputs(&mut self, inputs: usize) {
        let mut weights = vec![0.0; inputs.saturating_mul(self.outputs)];
        let kept = inputs.min(self.inputs);
        for row in 0..self.outputs {
            let old = row * self.inputs;
            let new = row * inputs;
            if let (Some(dst), Some(src)) = (
                weights.get_mut(new..new + kept),
                self.weights.get(old..old + kept),
            ) {
                dst.copy_from_slice(src);
            }
        }
        self.weights = weights;
        self.inputs = inputs;
    }

    fn forward<S: Scalar>(&self, input: &[S], use_bias: bool) -> Result<Vec<S>, ScalarError> {
        if input.len() != self.inputs {
            return Err(ScalarError::DimensionMismatch {
                expected: self.inputs,
                actual: input.len(),
            });
        }
        self.validate()?;

        let mut output = Vec::with_capacity(self.outputs);
        for (row, bias) in self.biases.iter().enumerate() {
            let mut sum = if use_bias {
                S::from_f64(*bias)
            } else {
                S::zero()
            };
            let weights = self.weights.iter().skip(row * self.inputs);
            for (&w, &x) in weights.zip(input) {
                sum += S::from_f64(w) * x;
            }
            output.push(activate(self.activation, sum));
        }
        Ok(output)
    }
}

// =============================================================================
// SPECIFICATION
// =============================================================================

/// One layer of a `NetworkSpec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub width: usize,
    #[serde(default)]
    pub activation: Activation,
}

/// Fully specified network template: topology plus initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_dim: usize,
    #[serde(default = "default_use_bias")]
    pub use_bias: bool,
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub init: Initialization,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_use_bias() -> bool {
    true
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl NetworkSpec {
    /// Spec with `input_dim` inputs and no layers.
    #[must_use]
    pub fn new(input_dim: usize) -> Self {
        Self {
            input_dim,
            use_bias: true,
            layers: Vec::new(),
            init: Initialization::default(),
            seed: DEFAULT_SEED,
        }
    }

    /// Append a layer.
    #[must_use]
    pub fn layer(mut self, activation: Activation, width: usize) -> Self {
        self.layers.push(LayerSpec { width, activation });
        self
    }

    #[must_use]
    pub fn init(mut self, init: Initialization) -> Self {
        self.init = init;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build and initialize the described network.
    #[must_use]
    pub fn build(&self) -> TinyNetwork {
        let mut net = TinyNetwork {
            input_dim: self.input_dim,
            use_bias: self.use_bias,
            seed: self.seed,
            layers: Vec::with_capacity(self.layers.len()),
        };
        for layer in &self.layers {
            <TinyNetwork as Network<f64>>::add_linear_layer(
                &mut net,
                layer.activation,
                layer.width,
            );
        }
        <TinyNetwork as Network<f64>>::initialize(&mut net, self.init);
        net
    }
}

// =============================================================================
// NETWORK
// =============================================================================

/// Small dense network evaluated on any `Scalar`.
///
/// Parameters are stored as `f64` and converted on the fly, so one template
/// can drive graphs of different scalar types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TinyNetwork {
    input_dim: usize,
    use_bias: bool,
    seed: u64,
    layers: Vec<DenseLayer>,
}

impl Default for TinyNetwork {
    fn default() -> Self {
        Self {
            input_dim: 0,
            use_bias: true,
            seed: DEFAULT_SEED,
            layers: Vec::new(),
        }
    }
}

impl TinyNetwork {
    /// Use a different seed for subsequent initializations.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn use_bias(&self) -> bool {
        self.use_bias
    }

    #[must_use]
    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Total number of weights and biases.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    /// Check every layer's buffers and that layer widths chain from
    /// `input_dim`.
    pub fn validate(&self) -> Result<(), ScalarError> {
        let mut width = self.input_dim;
        for layer in &self.layers {
            if layer.inputs != width {
                return Err(ScalarError::DimensionMismatch {
                    expected: width,
                    actual: layer.inputs,
                });
            }
            layer.validate()?;
            width = layer.outputs;
        }
        Ok(())
    }

    /// Overwrite the parameters of one layer.
    ///
    /// `weights` is row-major (`outputs` rows of `inputs` columns).
    pub fn set_layer_parameters(
        &mut self,
        index: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<(), ScalarError> {
        let layer_count = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(ScalarError::DimensionMismatch {
                expected: layer_count,
                actual: index,
            })?;
        if weights.len() != layer.weights.len() {
            return Err(ScalarError::DimensionMismatch {
                expected: layer.weights.len(),
                actual: weights.len(),
            });
        }
        if biases.len() != layer.biases.len() {
            return Err(ScalarError::DimensionMismatch {
                expected: layer.biases.len(),
                actual: biases.len(),
            });
        }
        layer.weights = weights;
        layer.biases = biases;
        Ok(())
    }
}

impl<S: Scalar> Network<S> for TinyNetwork {
    fn with_input_dim(input_dim: usize, use_bias: bool) -> Self {
        Self {
            input_dim,
            use_bias,
            ..Self::default()
        }
    }

    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, |l| l.outputs)
    }

    fn set_input_dim(&mut self, input_dim: usize) {
        self.input_dim = input_dim;
        if let Some(first) = self.layers.first_mut() {
            first.resize_inputs(input_dim);
        }
    }

    fn num_layers(&self) -> usize {
        self.layers.len()
    }

    fn add_linear_layer(&mut self, activation: Activation, width: usize) {
        let inputs = self.layers.last().map_or(self.input_dim, |l| l.outputs);
        self.layers.push(DenseLayer::zeroed(activation, inputs, width));
    }

    fn initialize(&mut self, method: Initialization) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        for layer in &mut self.layers {
            let fan_in = layer.inputs as f64;
            let fan_out = layer.outputs as f64;
            let limit = match method {
                Initialization::Zero => 0.0,
                Initialization::Xavier if fan_in + fan_out > 0.0 => {
                    (6.0 / (fan_in + fan_out)).sqrt()
                }
                Initialization::He if fan_in > 0.0 => (6.0 / fan_in).sqrt(),
                Initialization::Xavier | Initialization::He => 0.0,
            };
            for w in &mut layer.weights {
                *w = if limit > 0.0 {
                    rng.gen_range(-limit..=limit)
                } else {
                    0.0
                };
            }
            layer.biases.iter_mut().for_each(|b| *b = 0.0);
        }
    }

    fn compute(&self, inputs: &[S], outputs: &mut [S]) -> Result<(), ScalarError> {
        if inputs.len() != self.input_dim {
            return Err(ScalarError::DimensionMismatch {
                expected: self.input_dim,
                actual: inputs.len(),
            });
        }
        let output_dim = <Self as Network<S>>::output_dim(self);
        if outputs.len() != output_dim {
            return Err(ScalarError::DimensionMismatch {
                expected: output_dim,
                actual: outputs.len(),
            });
        }

        let mut current = inputs.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current, self.use_bias)?;
        }
        if current.len() != outputs.len() {
            return Err(ScalarError::DimensionMismatch {
                expected: outputs.len(),
                actual: current.len(),
            });
        }
        outputs.copy_from_slice(&current);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

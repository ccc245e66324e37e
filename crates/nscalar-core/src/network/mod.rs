//! # Network Evaluator
//!
//! The feed-forward network contract consumed by graph nodes.
//!
//! A node owns exactly one network. The engine only needs to grow its input
//! dimension, add an output layer, (re)initialize its weights and run a
//! forward pass; everything else is up to the implementation.
//!
//! `TinyNetwork` is the dense implementation shipped with the crate.

mod tiny;

pub use tiny::{DenseLayer, LayerSpec, NetworkSpec, TinyNetwork};

use crate::scalar::Scalar;
use crate::types::{Activation, Initialization, ScalarError};
use std::fmt::Debug;

/// Contract between a graph node and the network driving it.
///
/// `Default` must produce an empty network: zero inputs, zero layers and an
/// output dimension of zero.
pub trait Network<S: Scalar>: Clone + Debug + Default {
    /// Create a network with `input_dim` inputs and no layers.
    fn with_input_dim(input_dim: usize, use_bias: bool) -> Self;

    fn input_dim(&self) -> usize;

    /// Width of the last layer, or zero when the network has no layers.
    fn output_dim(&self) -> usize;

    /// Resize the input layer, keeping existing weights where they still fit.
    fn set_input_dim(&mut self, input_dim: usize);

    fn num_layers(&self) -> usize;

    fn add_linear_layer(&mut self, activation: Activation, width: usize);

    /// Reset every weight and bias according to `method`.
    fn initialize(&mut self, method: Initialization);

    /// Forward pass.
    ///
    /// `inputs.len()` must equal `input_dim()` and `outputs.len()` must equal
    /// `output_dim()`.
    fn compute(&self, inputs: &[S], outputs: &mut [S]) -> Result<(), ScalarError>;
}

/// Apply `activation` to a single value.
pub fn activate<S: Scalar>(activation: Activation, value: S) -> S {
    match activation {
        Activation::Identity => value,
        Activation::Relu => value.relu(),
        Activation::Tanh => value.tanh(),
        Activation::Sigmoid => value.sigmoid(),
    }
}

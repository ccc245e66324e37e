//! # Graph Descriptions
//!
//! TOML description of a graph: named plain values, blueprints and named
//! nodes that claim them.
//!
//! ```toml
//! [[value]]
//! name = "a"
//! value = 3.0
//!
//! [[blueprint]]
//! name = "b"
//! inputs = ["a"]
//! activation = "tanh"
//! weights = [[2.0]]
//! bias = [1.0]
//!
//! [[node]]
//! name = "b"
//! ```
//!
//! Values are named first, then blueprints are registered, then nodes claim
//! their names in file order. A blueprint may therefore only reference values
//! and nodes listed before the node that claims it.

use nscalar_core::{
    Activation, Initialization, LayerSpec, Network, NetworkSpec, ScalarError, ScalarGraph,
    TinyNetwork, primitives::DEFAULT_SEED,
};
use serde::Deserialize;
use std::path::Path;

/// Maximum size of a graph description file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// FILE FORMAT
// =============================================================================

/// Root of a graph description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    #[serde(default, rename = "value")]
    pub values: Vec<ValueEntry>,
    #[serde(default, rename = "blueprint")]
    pub blueprints: Vec<BlueprintEntry>,
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeEntry>,
}

/// A named plain value.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueEntry {
    pub name: String,
    pub value: f64,
}

/// Deferred wiring for a name.
///
/// The network is `hidden` layers followed by one output of `activation`.
/// Explicit `weights` (one row of `inputs.len()` or hidden-width columns)
/// and `bias` override the initialized parameters of the output layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlueprintEntry {
    pub name: String,
    pub inputs: Vec<String>,
    #[serde(default)]
    pub hidden: Vec<LayerSpec>,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub init: Initialization,
    pub seed: Option<u64>,
    #[serde(default = "default_use_bias")]
    pub use_bias: bool,
    pub weights: Option<Vec<Vec<f64>>>,
    pub bias: Option<Vec<f64>>,
}

/// A named node; claims the blueprint of the same name, if any.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeEntry {
    pub name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default = "default_residual")]
    pub residual: bool,
}

fn default_use_bias() -> bool {
    true
}

fn default_residual() -> bool {
    true
}

fn read_error(path: &Path, e: std::io::Error) -> ScalarError {
    ScalarError::IoError(format!("Cannot read '{}': {}", path.display(), e))
}

// =============================================================================
// LOADING
// =============================================================================

impl GraphConfig {
    /// Parse a description from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ScalarError> {
        toml::from_str(text).map_err(|e| {
            ScalarError::DeserializationError(format!("Invalid graph description: {}", e))
        })
    }

    /// Read and parse a description file.
    pub fn load(path: &Path) -> Result<Self, ScalarError> {
        let metadata = std::fs::metadata(path).map_err(|e| read_error(path, e))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ScalarError::DeserializationError(format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;
        Self::from_toml(&text)
    }

    // =========================================================================
    // BUILDING
    // =========================================================================

    /// Build the described graph.
    pub fn build(&self) -> Result<ScalarGraph, ScalarError> {
        let mut graph: ScalarGraph = ScalarGraph::new();

        for entry in &self.values {
            let id = graph.insert(entry.value);
            graph.assign_name(id, &entry.name)?;
        }

        for entry in &self.blueprints {
            graph.add_blueprint(&entry.name, entry.inputs.iter().cloned(), entry.network()?)?;
        }

        for entry in &self.nodes {
            let id = graph.insert(entry.value);
            graph.set_residual(id, entry.residual)?;
            graph.assign_name(id, &entry.name)?;
        }

        tracing::info!(
            nodes = graph.len(),
            blueprints = graph.registry().blueprint_count(),
            "graph built"
        );
        Ok(graph)
    }
}

impl BlueprintEntry {
    /// Network template for this blueprint.
    pub fn network(&self) -> Result<TinyNetwork, ScalarError> {
        let mut spec = NetworkSpec::new(self.inputs.len())
            .init(self.init)
            .seed(self.seed.unwrap_or(DEFAULT_SEED));
        spec.use_bias = self.use_bias;
        for layer in &self.hidden {
            spec = spec.layer(layer.activation, layer.width);
        }
        let mut network = spec.layer(self.activation, 1).build();

        if self.weights.is_some() || self.bias.is_some() {
            let output_index = Network::<f64>::num_layers(&network).saturating_sub(1);
            let fan_in = self
                .hidden
                .last()
                .map_or(self.inputs.len(), |layer| layer.width);
            let weights = match &self.weights {
                Some(rows) => rows.iter().flatten().copied().collect(),
                None => network.layers()[output_index].weights.clone(),
            };
            let bias = self.bias.clone().unwrap_or_else(|| vec![0.0]);
            if weights.len() != fan_in {
                return Err(ScalarError::DimensionMismatch {
                    expected: fan_in,
                    actual: weights.len(),
                });
            }
            network.set_layer_parameters(output_index, weights, bias)?;
        }
        Ok(network)
    }
}

// =============================================================================
// TESTS
// =============================================================================

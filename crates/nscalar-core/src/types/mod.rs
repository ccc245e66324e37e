//! # Core Type Definitions
//!
//! This module contains the shared types for the nscalar engine:
//! - Arena handles (`NodeId`)
//! - Network configuration enums (`Activation`, `Initialization`)
//! - Error types (`ScalarError`)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ARENA HANDLES
// =============================================================================

/// Handle to a node stored in a `ScalarGraph`.
///
/// A handle is an arena slot index paired with the generation of the slot at
/// the time the node was inserted. Removing a node bumps the slot generation,
/// so every handle still pointing at the old node stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Create a handle from its raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Slot generation this handle was issued for.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

// =============================================================================
// NETWORK CONFIGURATION
// =============================================================================

/// Activation applied element-wise at the output of a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Identity,
    Relu,
    Tanh,
    Sigmoid,
}

/// Weight initialization policy for a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Initialization {
    /// All weights and biases set to zero.
    Zero,
    /// Uniform in `±sqrt(6 / (fan_in + fan_out))`, biases zero.
    #[default]
    Xavier,
    /// Uniform in `±sqrt(6 / fan_in)`, biases zero.
    He,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the nscalar engine.
///
/// - No silent failures
/// - Use `Result<T, ScalarError>` for fallible operations
/// - The engine never aborts the process; callers decide how to surface errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScalarError {
    /// A blueprint lists an upstream name that no live node holds yet.
    #[error("NeuralScalar named \"{0}\" has been requested before it was assigned")]
    UnresolvedBlueprintUpstream(String),

    /// An engine consistency check failed.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Evaluation reached a node that is already being evaluated.
    #[error("Cyclic dependency through node {0}")]
    CyclicDependency(NodeId),

    /// Evaluation recursed deeper than `MAX_EVALUATION_DEPTH`.
    #[error("Evaluation depth exceeded at node {0}")]
    EvaluationDepthExceeded(NodeId),

    /// The handle does not refer to a live node.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node or blueprint name is empty or too long.
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// Network dimensions do not match the wiring they are attached to.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

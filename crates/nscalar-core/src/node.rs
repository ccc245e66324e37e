//! # Graph Node
//!
//! A lazily evaluated scalar cell.
//!
//! A node either holds a directly assigned value, or is driven by a small
//! network consuming the values of its inputs. The last evaluation result is
//! cached behind a dirty flag.
//!
//! Nodes are stored in a `ScalarGraph`; evaluation and every operation that
//! touches other nodes live there. This module only holds per-node state and
//! the rules that do not depend on the rest of the graph.

use crate::network::Network;
use crate::scalar::Scalar;
use crate::types::NodeId;

/// A scalar node, optionally driven by a network over its inputs.
#[derive(Debug, Clone)]
pub struct NeuralScalar<S: Scalar, N: Network<S>> {
    /// Value assigned from outside.
    pub(crate) value: S,
    /// Result of the last evaluation.
    pub(crate) cache: S,
    pub(crate) dirty: bool,
    /// Ordered inputs. `None` slots contribute zero.
    pub(crate) inputs: Vec<Option<NodeId>>,
    pub(crate) network: N,
    /// Nodes sharing a name share the canonical node's network and wiring.
    pub(crate) name: Option<String>,
    /// Whether the value is added to, or replaced by, the network output.
    pub(crate) residual: bool,
}

impl<S: Scalar, N: Network<S>> Default for NeuralScalar<S, N> {
    fn default() -> Self {
        Self::new(S::zero())
    }
}

impl<S: Scalar, N: Network<S>> NeuralScalar<S, N> {
    /// Plain node holding `value`.
    #[must_use]
    pub fn new(value: S) -> Self {
        Self {
            value,
            cache: S::zero(),
            dirty: true,
            inputs: Vec::new(),
            network: N::default(),
            name: None,
            residual: true,
        }
    }

    /// Node wired to `inputs` through `network`.
    #[must_use]
    pub fn wired(inputs: Vec<Option<NodeId>>, network: N) -> Self {
        Self {
            inputs,
            network,
            ..Self::new(S::zero())
        }
    }

    #[must_use]
    pub fn value(&self) -> S {
        self.value
    }

    /// Last evaluation result. Only meaningful when the node is clean.
    #[must_use]
    pub fn cached(&self) -> S {
        self.cache
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn inputs(&self) -> &[Option<NodeId>] {
        &self.inputs
    }

    #[must_use]
    pub fn network(&self) -> &N {
        &self.network
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn is_residual(&self) -> bool {
        self.residual
    }

    /// Whether this node has no inputs and evaluates to its own value.
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Mark the cache stale.
    ///
    /// A network without outputs has not been wired yet; such nodes stay
    /// clean so "not wired" remains distinguishable from "wired but stale".
    pub fn set_dirty(&mut self) {
        if self.network.output_dim() != 0 {
            self.dirty = true;
        }
    }

    /// Overwrite the assigned value. Wiring, network and name are kept.
    pub fn assign(&mut self, value: S) {
        self.value = value;
        self.set_dirty();
    }

    pub fn set_residual(&mut self, residual: bool) {
        if self.residual != residual {
            self.residual = residual;
            self.set_dirty();
        }
    }

    /// Combine a network output with the assigned value.
    pub(crate) fn combine(&self, output: S) -> S {
        if self.residual {
            self.value + output
        } else {
            output
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

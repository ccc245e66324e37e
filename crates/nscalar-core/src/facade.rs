//! # Scalar Utilities
//!
//! Stateless helpers that build plain nodes from literals and from scalar
//! math applied to evaluated nodes.
//!
//! None of these helpers wire inputs or networks; they are a convenience
//! layer over `ScalarGraph::insert` and `ScalarGraph::evaluate`.

use crate::graph::ScalarGraph;
use crate::network::Network;
use crate::scalar::Scalar;
use crate::types::{NodeId, ScalarError};
use std::f64::consts::{FRAC_PI_2, PI};

/// Constructors and math over plain nodes.
pub struct ScalarUtils;

impl ScalarUtils {
    /// Insert a plain node holding `value` converted to the graph's scalar.
    pub fn scalar_from_f64<S: Scalar, N: Network<S>>(
        graph: &mut ScalarGraph<S, N>,
        value: f64,
    ) -> NodeId {
        graph.insert(S::from_f64(value))
    }

    pub fn zero<S: Scalar, N: Network<S>>(graph: &mut ScalarGraph<S, N>) -> NodeId {
        Self::scalar_from_f64(graph, 0.0)
    }

    pub fn one<S: Scalar, N: Network<S>>(graph: &mut ScalarGraph<S, N>) -> NodeId {
        Self::scalar_from_f64(graph, 1.0)
    }

    pub fn two<S: Scalar, N: Network<S>>(graph: &mut ScalarGraph<S, N>) -> NodeId {
        Self::scalar_from_f64(graph, 2.0)
    }

    pub fn half<S: Scalar, N: Network<S>>(graph: &mut ScalarGraph<S, N>) -> NodeId {
        Self::scalar_from_f64(graph, 0.5)
    }

    pub fn pi<S: Scalar, N: Network<S>>(graph: &mut ScalarGraph<S, N>) -> NodeId {
        Self::scalar_from_f64(graph, PI)
    }

    pub fn half_pi<S: Scalar, N: Network<S>>(graph: &mut ScalarGraph<S, N>) -> NodeId {
        Self::scalar_from_f64(graph, FRAC_PI_2)
    }

    /// Insert `num / denom`, computed in `f64`.
    ///
    /// A zero denominator is an `InvariantViolation`.
    pub fn fraction<S: Scalar, N: Network<S>>(
        graph: &mut ScalarGraph<S, N>,
        num: i32,
        denom: i32,
    ) -> Result<NodeId, ScalarError> {
        Self::full_assert(denom != 0, "fraction denominator must be non-zero")?;
        Ok(Self::scalar_from_f64(graph, f64::from(num) / f64::from(denom)))
    }

    /// Insert an integer literal.
    pub fn convert<S: Scalar, N: Network<S>>(graph: &mut ScalarGraph<S, N>, value: i32) -> NodeId {
        Self::scalar_from_f64(graph, f64::from(value))
    }

    /// Evaluate `id` and convert the result to `f64`.
    pub fn to_f64<S: Scalar, N: Network<S>>(
        graph: &mut ScalarGraph<S, N>,
        id: NodeId,
    ) -> Result<f64, ScalarError> {
        Ok(graph.evaluate(id)?.to_f64())
    }

    pub fn sin<S: Scalar, N: Network<S>>(
        graph: &mut ScalarGraph<S, N>,
        id: NodeId,
    ) -> Result<NodeId, ScalarError> {
        Self::map(graph, id, S::sin)
    }

    pub fn cos<S: Scalar, N: Network<S>>(
        graph: &mut ScalarGraph<S, N>,
        id: NodeId,
    ) -> Result<NodeId, ScalarError> {
        Self::map(graph, id, S::cos)
    }

    pub fn sqrt<S: Scalar, N: Network<S>>(
        graph: &mut ScalarGraph<S, N>,
        id: NodeId,
    ) -> Result<NodeId, ScalarError> {
        Self::map(graph, id, S::sqrt)
    }

    fn map<S: Scalar, N: Network<S>>(
        graph: &mut ScalarGraph<S, N>,
        id: NodeId,
        f: impl FnOnce(S) -> S,
    ) -> Result<NodeId, ScalarError> {
        let value = graph.evaluate(id)?;
        Ok(graph.insert(f(value)))
    }

    /// Insert one plain node per value, preserving order.
    pub fn to_graph<S: Scalar, N: Network<S>>(
        graph: &mut ScalarGraph<S, N>,
        values: &[S],
    ) -> Vec<NodeId> {
        values.iter().map(|&v| graph.insert(v)).collect()
    }

    /// Evaluate every node, preserving order.
    pub fn from_graph<S: Scalar, N: Network<S>>(
        graph: &mut ScalarGraph<S, N>,
        ids: &[NodeId],
    ) -> Result<Vec<S>, ScalarError> {
        ids.iter().map(|&id| graph.evaluate(id)).collect()
    }

    /// Consistency check surfaced as an error instead of an abort.
    pub fn full_assert(condition: bool, description: &str) -> Result<(), ScalarError> {
        if condition {
            Ok(())
        } else {
            Err(ScalarError::InvariantViolation(description.to_string()))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

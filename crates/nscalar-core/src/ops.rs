//! # Node Arithmetic
//!
//! Arithmetic and comparisons between nodes.
//!
//! Every operation evaluates its operands first. Binary and unary operations
//! insert a new plain node holding the result: arithmetic never copies graph
//! wiring, and only `connect` creates edges. Compound forms overwrite the
//! target's assigned value in place.

use crate::graph::ScalarGraph;
use crate::network::Network;
use crate::scalar::Scalar;
use crate::types::{NodeId, ScalarError};
use std::cmp::Ordering;

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// Apply the operator to two scalars.
    pub fn apply<S: Scalar>(self, lhs: S, rhs: S) -> S {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
        }
    }
}

impl<S: Scalar, N: Network<S>> ScalarGraph<S, N> {
    /// Evaluate both operands and insert a plain node holding `lhs op rhs`.
    pub fn binary(&mut self, op: ArithOp, lhs: NodeId, rhs: NodeId) -> Result<NodeId, ScalarError> {
        let a = self.evaluate(lhs)?;
        let b = self.evaluate(rhs)?;
        Ok(self.insert(op.apply(a, b)))
    }

    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> Result<NodeId, ScalarError> {
        self.binary(ArithOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: NodeId, rhs: NodeId) -> Result<NodeId, ScalarError> {
        self.binary(ArithOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: NodeId, rhs: NodeId) -> Result<NodeId, ScalarError> {
        self.binary(ArithOp::Mul, lhs, rhs)
    }

    pub fn div(&mut self, lhs: NodeId, rhs: NodeId) -> Result<NodeId, ScalarError> {
        self.binary(ArithOp::Div, lhs, rhs)
    }

    /// Insert a plain node holding the negated evaluation of `operand`.
    pub fn neg(&mut self, operand: NodeId) -> Result<NodeId, ScalarError> {
        let value = self.evaluate(operand)?;
        Ok(self.insert(-value))
    }

    /// `target.value = target.value op evaluate(other)`.
    ///
    /// The cache is left alone; the node is marked dirty under the usual
    /// output guard.
    pub fn compound(
        &mut self,
        op: ArithOp,
        target: NodeId,
        other: NodeId,
    ) -> Result<(), ScalarError> {
        let current = self.value(target)?;
        let operand = self.evaluate(other)?;
        self.assign_value(target, op.apply(current, operand))
    }

    pub fn add_assign(&mut self, target: NodeId, other: NodeId) -> Result<(), ScalarError> {
        self.compound(ArithOp::Add, target, other)
    }

    pub fn sub_assign(&mut self, target: NodeId, other: NodeId) -> Result<(), ScalarError> {
        self.compound(ArithOp::Sub, target, other)
    }

    pub fn mul_assign(&mut self, target: NodeId, other: NodeId) -> Result<(), ScalarError> {
        self.compound(ArithOp::Mul, target, other)
    }

    pub fn div_assign(&mut self, target: NodeId, other: NodeId) -> Result<(), ScalarError> {
        self.compound(ArithOp::Div, target, other)
    }

    // =========================================================================
    // COMPARISONS
    // =========================================================================

    /// Compare the evaluations of two nodes.
    pub fn compare(&mut self, lhs: NodeId, rhs: NodeId) -> Result<Option<Ordering>, ScalarError> {
        let a = self.evaluate(lhs)?;
        let b = self.evaluate(rhs)?;
        Ok(a.partial_cmp(&b))
    }

    pub fn lt(&mut self, lhs: NodeId, rhs: NodeId) -> Result<bool, ScalarError> {
        Ok(self.compare(lhs, rhs)? == Some(Ordering::Less))
    }

    pub fn le(&mut self, lhs: NodeId, rhs: NodeId) -> Result<bool, ScalarError> {
        Ok(matches!(
            self.compare(lhs, rhs)?,
            Some(Ordering::Less | Ordering::Equal)
        ))
    }

    pub fn gt(&mut self, lhs: NodeId, rhs: NodeId) -> Result<bool, ScalarError> {
        Ok(self.compare(lhs, rhs)? == Some(Ordering::Greater))
    }

    pub fn ge(&mut self, lhs: NodeId, rhs: NodeId) -> Result<bool, ScalarError> {
        Ok(matches!(
            self.compare(lhs, rhs)?,
            Some(Ordering::Greater | Ordering::Equal)
        ))
    }

    /// Equality of evaluations (not of wiring).
    pub fn eq_value(&mut self, lhs: NodeId, rhs: NodeId) -> Result<bool, ScalarError> {
        let a = self.evaluate(lhs)?;
        let b = self.evaluate(rhs)?;
        Ok(a == b)
    }

    pub fn ne_value(&mut self, lhs: NodeId, rhs: NodeId) -> Result<bool, ScalarError> {
        Ok(!self.eq_value(lhs, rhs)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

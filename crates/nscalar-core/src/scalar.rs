//! # Numeric Scalar
//!
//! The arithmetic capability the engine is generic over.
//!
//! The engine never inspects a scalar beyond this trait: it adds, multiplies,
//! compares and converts through `f64` at the edges.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Opaque numeric value held by graph nodes.
pub trait Scalar:
    Copy
    + Debug
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;

    fn sin(self) -> Self;

    fn cos(self) -> Self;

    fn sqrt(self) -> Self;

    /// Maximum of `self` and zero.
    fn relu(self) -> Self {
        if self > Self::zero() { self } else { Self::zero() }
    }

    fn tanh(self) -> Self {
        Self::from_f64(self.to_f64().tanh())
    }

    fn sigmoid(self) -> Self {
        Self::from_f64(1.0 / (1.0 + (-self.to_f64()).exp()))
    }
}

impl Scalar for f64 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn sin(self) -> Self {
        f64::sin(self)
    }

    fn cos(self) -> Self {
        f64::cos(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn tanh(self) -> Self {
        f64::tanh(self)
    }
}

impl Scalar for f32 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn sin(self) -> Self {
        f32::sin(self)
    }

    fn cos(self) -> Self {
        f32::cos(self)
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    fn tanh(self) -> Self {
        f32::tanh(self)
    }
}

//! The seam between the engine and the library that builds real objects.
//!
//! The engine never inspects domain values. It only needs to combine them with
//! the arithmetic operators below and to classify plain values so a resolution
//! pass can decide which scope bindings to pick up by default.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary operators produced by expression composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition: `a + b`.
    Add,
    /// Multiplication: `a * b`.
    Mul,
    /// Exponentiation: `a ** b`.
    Pow,
    /// Division: `a / b`.
    Div,
}

impl BinaryOp {
    /// Infix spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Mul => "*",
            BinaryOp::Pow => "**",
            BinaryOp::Div => "/",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A library of domain objects that deferred nodes materialize into.
///
/// Implementors pick the value and error types; constructors and functions
/// are supplied separately as closures (see [`crate::Constructor`] and
/// [`crate::Function`]), so a domain only has to provide arithmetic and a
/// coarse classification of its values.
///
/// # Examples
///
/// ```
/// use christen::{BinaryOp, Domain};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("division by zero")]
/// struct DivByZero;
///
/// struct Numbers;
///
/// impl Domain for Numbers {
///     type Value = f64;
///     type Error = DivByZero;
///
///     fn binary(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, DivByZero> {
///         Ok(match op {
///             BinaryOp::Add => lhs + rhs,
///             BinaryOp::Mul => lhs * rhs,
///             BinaryOp::Pow => lhs.powf(rhs),
///             BinaryOp::Div if rhs == 0.0 => return Err(DivByZero),
///             BinaryOp::Div => lhs / rhs,
///         })
///     }
///
///     fn kind_of(_value: &f64) -> &'static str {
///         "number"
///     }
///
///     fn base_kinds() -> &'static [&'static str] {
///         &["number"]
///     }
/// }
/// ```
pub trait Domain: Sized + 'static {
    /// Materialized objects.
    type Value: Clone + fmt::Debug + 'static;
    /// Failures raised by constructors, functions and operators.
    type Error: std::error::Error + 'static;

    /// Apply a binary operator to two materialized operands.
    fn binary(op: BinaryOp, lhs: Self::Value, rhs: Self::Value)
    -> Result<Self::Value, Self::Error>;

    /// Kind tag of a plain value, matched against
    /// [`crate::ResolveOptions::included`].
    fn kind_of(value: &Self::Value) -> &'static str;

    /// Kinds picked up from a scope by default when no selection is given.
    fn base_kinds() -> &'static [&'static str];
}

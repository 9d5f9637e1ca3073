//! A small symbolic domain.
//!
//! [`Symbolic`] stands in for a computer-algebra library: random variables are
//! named symbols carrying their distribution, arithmetic builds expression
//! trees and folds numeric constants. It is enough to exercise the engine end
//! to end and to serve as a template for real domains.
//!
//! ```
//! use christen::symbolic::{cos, normal, sin, Sym, Symbolic};
//! use christen::{Arguments, Scope};
//!
//! let mut scope = Scope::<Symbolic>::new();
//! let x = scope.bind_expr("x", normal().call(Arguments::new().arg(0.0).arg(1.0)));
//! scope.bind_expr("one", sin(&x).pow(2.0) + cos(&x).pow(2.0));
//!
//! let model = scope.resolve().unwrap();
//! assert_eq!(model.value("one").unwrap().to_string(), "sin(x)**2 + cos(x)**2");
//! ```

use std::fmt;
use std::ops;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deferred::{Constructor, Wrapper};
use crate::domain::{BinaryOp, Domain};
use crate::expr::{self, Expr, Function, Operand};
use crate::term::{Resolved, Term};

/// Symbolic values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sym {
    /// Numeric constant.
    Number(f64),
    /// Free symbol.
    Symbol(String),
    /// Named random variable.
    Random {
        name: String,
        distribution: String,
        params: Vec<Sym>,
    },
    /// Function application, e.g. `sin(x)`.
    Apply { function: String, args: Vec<Sym> },
    /// Binary arithmetic.
    Binary {
        op: BinaryOp,
        lhs: Box<Sym>,
        rhs: Box<Sym>,
    },
}

impl Sym {
    /// Free symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        Sym::Symbol(name.into())
    }

    /// Unevaluated binary expression.
    pub fn binary(op: BinaryOp, lhs: Sym, rhs: Sym) -> Self {
        Sym::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Numeric value, if constant.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Sym::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Display name of a symbol or random variable.
    pub fn name(&self) -> Option<&str> {
        match self {
            Sym::Symbol(name) | Sym::Random { name, .. } => Some(name),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Sym::Binary { op, .. } => match op {
                BinaryOp::Add => 1,
                BinaryOp::Mul | BinaryOp::Div => 2,
                BinaryOp::Pow => 3,
            },
            Sym::Number(v) if *v < 0.0 => 1,
            _ => 4,
        }
    }
}

impl From<f64> for Sym {
    fn from(v: f64) -> Self {
        Sym::Number(v)
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sym::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Sym::Number(v) => write!(f, "{v}"),
            Sym::Symbol(name) | Sym::Random { name, .. } => f.write_str(name),
            Sym::Apply { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Sym::Binary { op, lhs, rhs } => {
                let prec = self.precedence();
                // `-` and `/` do not exist here, but `/` and `**` still need
                // the tighter side grouped: a/(b*c), (a**b)**c.
                let (lhs_min, rhs_min) = match op {
                    BinaryOp::Pow => (prec + 1, prec),
                    BinaryOp::Div => (prec, prec + 1),
                    BinaryOp::Add | BinaryOp::Mul => (prec, prec),
                };
                write_operand(f, lhs, lhs_min)?;
                match op {
                    BinaryOp::Add => f.write_str(" + ")?,
                    other => f.write_str(other.symbol())?,
                }
                write_operand(f, rhs, rhs_min)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Sym, min_precedence: u8) -> fmt::Result {
    if operand.precedence() < min_precedence {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}

/// Errors raised by the symbolic library.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SymbolicError {
    #[error("{distribution}: {reason}")]
    InvalidParameter {
        distribution: String,
        reason: String,
    },

    #[error("{function}() takes {expected} arguments ({got} given)")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("division by zero")]
    DivisionByZero,
}

/// Marker type for the symbolic domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Symbolic;

impl Domain for Symbolic {
    type Value = Sym;
    type Error = SymbolicError;

    fn binary(op: BinaryOp, lhs: Sym, rhs: Sym) -> Result<Sym, SymbolicError> {
        match (op, lhs.as_number(), rhs.as_number()) {
            (BinaryOp::Div, _, Some(r)) if r == 0.0 => Err(SymbolicError::DivisionByZero),
            (op, Some(l), Some(r)) => Ok(Sym::Number(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Mul => l * r,
                BinaryOp::Pow => l.powf(r),
                BinaryOp::Div => l / r,
            })),
            _ => Ok(Sym::binary(op, lhs, rhs)),
        }
    }

    fn kind_of(value: &Sym) -> &'static str {
        match value {
            Sym::Number(_) => "number",
            Sym::Symbol(_) => "symbol",
            Sym::Random { .. } => "random",
            Sym::Apply { .. } | Sym::Binary { .. } => "expression",
        }
    }

    fn base_kinds() -> &'static [&'static str] {
        &["number", "symbol", "random", "expression"]
    }
}

impl From<Sym> for Operand<Symbolic> {
    fn from(value: Sym) -> Self {
        Operand::Value(value)
    }
}

impl From<f64> for Operand<Symbolic> {
    fn from(v: f64) -> Self {
        Operand::Value(Sym::Number(v))
    }
}

impl From<Sym> for Term<Symbolic> {
    fn from(value: Sym) -> Self {
        Term::Value(value)
    }
}

impl From<f64> for Term<Symbolic> {
    fn from(v: f64) -> Self {
        Term::Value(Sym::Number(v))
    }
}

impl ops::Add<Expr<Symbolic>> for f64 {
    type Output = Expr<Symbolic>;

    fn add(self, rhs: Expr<Symbolic>) -> Expr<Symbolic> {
        expr::radd(&rhs, self)
    }
}

impl ops::Add<&Expr<Symbolic>> for f64 {
    type Output = Expr<Symbolic>;

    fn add(self, rhs: &Expr<Symbolic>) -> Expr<Symbolic> {
        expr::radd(rhs, self)
    }
}

/// Reads distribution parameters from positional-then-keyword arguments.
struct Params<'a> {
    distribution: &'a str,
    positional: Vec<Resolved<Sym>>,
    keyword: IndexMap<String, Resolved<Sym>>,
}

impl<'a> Params<'a> {
    fn new(
        distribution: &'a str,
        names: &[&str],
        positional: Vec<Resolved<Sym>>,
        keyword: IndexMap<String, Resolved<Sym>>,
    ) -> Result<Self, SymbolicError> {
        let got = positional.len() + keyword.len();
        if got != names.len() {
            return Err(SymbolicError::Arity {
                function: distribution.to_string(),
                expected: names.len(),
                got,
            });
        }
        if let Some(unknown) = keyword.keys().find(|k| !names.contains(&k.as_str())) {
            return Err(SymbolicError::InvalidParameter {
                distribution: distribution.to_string(),
                reason: format!("unexpected keyword argument `{unknown}`"),
            });
        }
        Ok(Self {
            distribution,
            positional,
            keyword,
        })
    }

    fn take(&mut self, index: usize, name: &str) -> Result<Sym, SymbolicError> {
        let resolved = if index < self.positional.len() {
            std::mem::replace(&mut self.positional[index], Resolved::Seq(Vec::new()))
        } else {
            match self.keyword.shift_remove(name) {
                Some(resolved) => resolved,
                None => return Err(self.invalid(format!("missing argument `{name}`"))),
            }
        };
        resolved
            .into_value()
            .ok_or_else(|| self.invalid(format!("`{name}` must be a single value")))
    }

    fn invalid(&self, reason: String) -> SymbolicError {
        SymbolicError::InvalidParameter {
            distribution: self.distribution.to_string(),
            reason,
        }
    }
}

fn random(name: &str, distribution: &str, params: Vec<Sym>) -> Sym {
    Sym::Random {
        name: name.to_string(),
        distribution: distribution.to_string(),
        params,
    }
}

/// `Normal(name, mean, std)`; a numeric `std` must be positive.
pub fn normal() -> Wrapper<Symbolic> {
    Wrapper::new(Constructor::new("stats.Normal", |name, positional, keyword| {
        let mut params = Params::new("Normal", &["mean", "std"], positional, keyword)?;
        let mean = params.take(0, "mean")?;
        let std = params.take(1, "std")?;
        if std.as_number().is_some_and(|s| s <= 0.0) {
            return Err(params.invalid("standard deviation must be positive".to_string()));
        }
        Ok(random(name, "Normal", vec![mean, std]))
    }))
}

/// `Uniform(name, left, right)`; numeric bounds must satisfy `left < right`.
pub fn uniform() -> Wrapper<Symbolic> {
    Wrapper::new(Constructor::new("stats.Uniform", |name, positional, keyword| {
        let mut params = Params::new("Uniform", &["left", "right"], positional, keyword)?;
        let left = params.take(0, "left")?;
        let right = params.take(1, "right")?;
        if let (Some(l), Some(r)) = (left.as_number(), right.as_number())
            && l >= r
        {
            return Err(params.invalid("left bound must be below right bound".to_string()));
        }
        Ok(random(name, "Uniform", vec![left, right]))
    }))
}

fn unary(name: &'static str, numeric: fn(f64) -> f64) -> Function<Symbolic> {
    Function::new(name, move |args: &[Sym]| match args {
        [Sym::Number(v)] => Ok(Sym::Number(numeric(*v))),
        [arg] => Ok(Sym::Apply {
            function: name.to_string(),
            args: vec![arg.clone()],
        }),
        _ => Err(SymbolicError::Arity {
            function: name.to_string(),
            expected: 1,
            got: args.len(),
        }),
    })
}

/// `sin(x)`.
pub fn sin(x: impl Into<Operand<Symbolic>>) -> Expr<Symbolic> {
    Expr::apply(unary("sin", f64::sin), [x])
}

/// `cos(x)`.
pub fn cos(x: impl Into<Operand<Symbolic>>) -> Expr<Symbolic> {
    Expr::apply(unary("cos", f64::cos), [x])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_fold() {
        let sum = Symbolic::binary(BinaryOp::Add, 1.0.into(), 2.0.into()).unwrap();
        assert_eq!(sum, Sym::Number(3.0));
    }

    #[test]
    fn test_division_by_zero() {
        let err = Symbolic::binary(BinaryOp::Div, Sym::symbol("x"), 0.0.into()).unwrap_err();
        assert_eq!(err, SymbolicError::DivisionByZero);
    }

    #[test]
    fn test_display_precedence() {
        let x = Sym::symbol("x");
        let y = Sym::symbol("y");
        let sum = Sym::binary(BinaryOp::Add, x.clone(), y.clone());
        let product = Sym::binary(BinaryOp::Mul, sum.clone(), x.clone());
        assert_eq!(product.to_string(), "(x + y)*x");
        let ratio = Sym::binary(BinaryOp::Div, x.clone(), Sym::binary(BinaryOp::Mul, y, x.clone()));
        assert_eq!(ratio.to_string(), "x/(y*x)");
        let tower = Sym::binary(BinaryOp::Pow, Sym::binary(BinaryOp::Pow, x, 2.0.into()), 3.0.into());
        assert_eq!(tower.to_string(), "(x**2)**3");
    }

    #[test]
    fn test_normal_checks_arity() {
        let err = normal()
            .constructor()
            .invoke("x", vec![Resolved::Value(0.0.into())], IndexMap::new())
            .unwrap_err();
        assert_eq!(
            err,
            SymbolicError::Arity {
                function: "Normal".to_string(),
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_normal_accepts_keywords() {
        let mut keyword = IndexMap::new();
        keyword.insert("std".to_string(), Resolved::Value(2.0.into()));
        let value = normal()
            .constructor()
            .invoke("x", vec![Resolved::Value(0.0.into())], keyword)
            .unwrap();
        assert_eq!(value, random("x", "Normal", vec![0.0.into(), 2.0.into()]));
    }

    #[test]
    fn test_normal_rejects_non_positive_std() {
        let err = normal()
            .constructor()
            .invoke(
                "x",
                vec![Resolved::Value(0.0.into()), Resolved::Value(0.0.into())],
                IndexMap::new(),
            )
            .unwrap_err();
        assert!(matches!(err, SymbolicError::InvalidParameter { .. }));
    }

    #[test]
    fn test_uniform_bounds() {
        let err = uniform()
            .constructor()
            .invoke(
                "u",
                vec![Resolved::Value(2.0.into()), Resolved::Value(1.0.into())],
                IndexMap::new(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("left bound"));
    }

    #[test]
    fn test_unary_folds_numbers() {
        let f = unary("sin", f64::sin);
        assert_eq!(f.call(&[Sym::Number(0.0)]).unwrap(), Sym::Number(0.0));
        let applied = f.call(&[Sym::symbol("x")]).unwrap();
        assert_eq!(applied.to_string(), "sin(x)");
    }
}

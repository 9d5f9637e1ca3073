//! Expression nodes.
//!
//! An [`Expr`] is a shared handle to a node that has not been materialized yet.
//! Nodes come in two variants:
//!
//! - [`NodeKind::Operation`] - an operator applied to operands, built by the
//!   composition functions in this module ([`add`], [`radd`], [`mul`],
//!   [`pow`], [`div`]), the `+ * /` operators, or [`Expr::apply`].
//! - [`NodeKind::Deferred`] - a pending constructor call that still lacks its
//!   name, built by a [`Wrapper`](crate::Wrapper) or [`construct`](crate::construct).
//!
//! Composition never fails. Errors surface only when the tree is resolved.
//!
//! # Examples
//!
//! ```
//! use christen::expr::{add, mul};
//! use christen::symbolic::{normal, Sym};
//! use christen::Arguments;
//!
//! let x = normal().call(Arguments::new().arg(0.0).arg(1.0));
//! let squared = mul(&x, &x);
//! let total = add(&squared, Sym::from(1.0));
//! assert_eq!(total.operands().len(), 2);
//! ```

use std::borrow::Cow;
use std::cell::OnceCell;
use std::fmt;
use std::ops;
use std::rc::Rc;

use tracing::warn;

use crate::deferred::DeferredConstruction;
use crate::domain::{BinaryOp, Domain};
use crate::ids::NodeId;

/// Closure type behind a [`Function`].
pub type FunctionImpl<D> =
    dyn Fn(&[<D as Domain>::Value]) -> Result<<D as Domain>::Value, <D as Domain>::Error>;

/// A named domain function usable as an operator, e.g. `sin`.
pub struct Function<D: Domain> {
    name: Cow<'static, str>,
    func: Rc<FunctionImpl<D>>,
}

impl<D: Domain> Function<D> {
    /// Wrap a closure over materialized values.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&[D::Value]) -> Result<D::Value, D::Error> + 'static,
    {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    /// Display name of the function.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, args: &[D::Value]) -> Result<D::Value, D::Error> {
        (self.func)(args)
    }
}

impl<D: Domain> Clone for Function<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: Rc::clone(&self.func),
        }
    }
}

impl<D: Domain> fmt::Debug for Function<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name).finish()
    }
}

/// Operator stored in an [`Operation`].
pub enum Operator<D: Domain> {
    /// Arithmetic dispatched to [`Domain::binary`]. Always has two operands.
    Binary(BinaryOp),
    /// Domain function applied to all operands.
    Function(Function<D>),
}

impl<D: Domain> Clone for Operator<D> {
    fn clone(&self) -> Self {
        match self {
            Operator::Binary(op) => Operator::Binary(*op),
            Operator::Function(func) => Operator::Function(func.clone()),
        }
    }
}

impl<D: Domain> fmt::Debug for Operator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Binary(op) => f.debug_tuple("Binary").field(op).finish(),
            Operator::Function(func) => f.debug_tuple("Function").field(&func.name).finish(),
        }
    }
}

/// One operand of an [`Operation`]: another node or a plain value.
pub enum Operand<D: Domain> {
    Node(Expr<D>),
    Value(D::Value),
}

impl<D: Domain> Clone for Operand<D> {
    fn clone(&self) -> Self {
        match self {
            Operand::Node(expr) => Operand::Node(expr.clone()),
            Operand::Value(value) => Operand::Value(value.clone()),
        }
    }
}

impl<D: Domain> fmt::Debug for Operand<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Node(expr) => expr.fmt(f),
            Operand::Value(value) => value.fmt(f),
        }
    }
}

impl<D: Domain> From<Expr<D>> for Operand<D> {
    fn from(expr: Expr<D>) -> Self {
        Operand::Node(expr)
    }
}

impl<D: Domain> From<&Expr<D>> for Operand<D> {
    fn from(expr: &Expr<D>) -> Self {
        Operand::Node(expr.clone())
    }
}

/// An operator applied to an ordered list of operands.
pub struct Operation<D: Domain> {
    pub(crate) operator: Operator<D>,
    pub(crate) operands: Vec<Operand<D>>,
}

impl<D: Domain> Operation<D> {
    /// The operator.
    pub fn operator(&self) -> &Operator<D> {
        &self.operator
    }

    /// The operands, in application order.
    pub fn operands(&self) -> &[Operand<D>] {
        &self.operands
    }
}

/// Node variants.
pub enum NodeKind<D: Domain> {
    Operation(Operation<D>),
    Deferred(DeferredConstruction<D>),
}

pub(crate) struct Node<D: Domain> {
    pub(crate) id: NodeId,
    pub(crate) name: OnceCell<String>,
    pub(crate) kind: NodeKind<D>,
    pub(crate) resolved: OnceCell<D::Value>,
}

/// Shared handle to a deferred node.
///
/// Cloning the handle shares the node, including its resolved value: a node
/// reachable from several parents is materialized once per process.
pub struct Expr<D: Domain>(Rc<Node<D>>);

impl<D: Domain> Expr<D> {
    pub(crate) fn from_kind(kind: NodeKind<D>) -> Self {
        Self(Rc::new(Node {
            id: NodeId::fresh(),
            name: OnceCell::new(),
            kind,
            resolved: OnceCell::new(),
        }))
    }

    fn operation(operator: Operator<D>, operands: Vec<Operand<D>>) -> Self {
        Self::from_kind(NodeKind::Operation(Operation { operator, operands }))
    }

    /// Apply a domain function to the given operands.
    pub fn apply<I>(function: Function<D>, operands: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand<D>>,
    {
        Self::operation(
            Operator::Function(function),
            operands.into_iter().map(Into::into).collect(),
        )
    }

    /// `self ** exponent`.
    pub fn pow(&self, exponent: impl Into<Operand<D>>) -> Self {
        pow(self, exponent)
    }

    /// Tag this node with an explicit name.
    ///
    /// Explicit names take precedence over names recovered from a scope. The
    /// first tag sticks; later tags are ignored. An empty name is no tag.
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            return self;
        }
        if let Err(rejected) = self.0.name.set(name)
            && self.0.name.get() != Some(&rejected)
        {
            warn!(node = %self.id(), %rejected, "node already named, keeping first name");
        }
        self
    }

    /// Identity of the node.
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Explicit name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.0.name.get().map(String::as_str)
    }

    /// Node variant.
    pub fn kind(&self) -> &NodeKind<D> {
        &self.0.kind
    }

    /// Operands of an operation node; empty for deferred constructions.
    pub fn operands(&self) -> &[Operand<D>] {
        match &self.0.kind {
            NodeKind::Operation(op) => &op.operands,
            NodeKind::Deferred(_) => &[],
        }
    }

    /// Materialized value, once a resolution pass has produced it.
    pub fn resolved(&self) -> Option<&D::Value> {
        self.0.resolved.get()
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn slot(&self) -> &OnceCell<D::Value> {
        &self.0.resolved
    }
}

impl<D: Domain> Clone for Expr<D> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<D: Domain> fmt::Debug for Expr<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Expr");
        s.field("id", &self.0.id);
        if let Some(name) = self.0.name.get() {
            s.field("name", name);
        }
        match &self.0.kind {
            NodeKind::Operation(op) => s
                .field("operator", &op.operator)
                .field("operands", &op.operands),
            NodeKind::Deferred(deferred) => s.field("deferred", deferred),
        };
        s.finish()
    }
}

/// `lhs + rhs`.
pub fn add<D: Domain>(lhs: &Expr<D>, rhs: impl Into<Operand<D>>) -> Expr<D> {
    Expr::operation(Operator::Binary(BinaryOp::Add), vec![lhs.into(), rhs.into()])
}

/// `lhs + rhs` where the node is the right-hand side.
pub fn radd<D: Domain>(rhs: &Expr<D>, lhs: impl Into<Operand<D>>) -> Expr<D> {
    Expr::operation(Operator::Binary(BinaryOp::Add), vec![lhs.into(), rhs.into()])
}

/// `lhs * rhs`.
pub fn mul<D: Domain>(lhs: &Expr<D>, rhs: impl Into<Operand<D>>) -> Expr<D> {
    Expr::operation(Operator::Binary(BinaryOp::Mul), vec![lhs.into(), rhs.into()])
}

/// `base ** exponent`.
pub fn pow<D: Domain>(base: &Expr<D>, exponent: impl Into<Operand<D>>) -> Expr<D> {
    Expr::operation(
        Operator::Binary(BinaryOp::Pow),
        vec![base.into(), exponent.into()],
    )
}

/// `lhs / rhs`.
pub fn div<D: Domain>(lhs: &Expr<D>, rhs: impl Into<Operand<D>>) -> Expr<D> {
    Expr::operation(Operator::Binary(BinaryOp::Div), vec![lhs.into(), rhs.into()])
}

macro_rules! impl_binary_ops {
    ($($trait:ident :: $method:ident => $builder:ident),* $(,)?) => {$(
        impl<D: Domain, R: Into<Operand<D>>> ops::$trait<R> for Expr<D> {
            type Output = Expr<D>;

            fn $method(self, rhs: R) -> Expr<D> {
                $builder(&self, rhs)
            }
        }

        impl<D: Domain, R: Into<Operand<D>>> ops::$trait<R> for &Expr<D> {
            type Output = Expr<D>;

            fn $method(self, rhs: R) -> Expr<D> {
                $builder(self, rhs)
            }
        }
    )*};
}

impl_binary_ops! {
    Add::add => add,
    Mul::mul => mul,
    Div::div => div,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::{Sym, Symbolic, normal};
    use crate::Arguments;

    fn deferred() -> Expr<Symbolic> {
        normal().call(Arguments::new().arg(0.0).arg(1.0))
    }

    fn binary_parts(expr: &Expr<Symbolic>) -> (BinaryOp, Vec<Operand<Symbolic>>) {
        match expr.kind() {
            NodeKind::Operation(op) => match op.operator() {
                Operator::Binary(bin) => (*bin, op.operands().to_vec()),
                other => panic!("expected binary operator, got {other:?}"),
            },
            NodeKind::Deferred(_) => panic!("expected operation"),
        }
    }

    #[test]
    fn test_add_keeps_operand_order() {
        let x = deferred();
        let sum = add(&x, Sym::from(2.0));
        let (op, operands) = binary_parts(&sum);
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(&operands[0], Operand::Node(n) if n.ptr_eq(&x)));
        assert!(matches!(&operands[1], Operand::Value(Sym::Number(v)) if *v == 2.0));
    }

    #[test]
    fn test_radd_places_other_first() {
        let x = deferred();
        let sum = radd(&x, Sym::from(1.0));
        let (op, operands) = binary_parts(&sum);
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(&operands[0], Operand::Value(Sym::Number(v)) if *v == 1.0));
        assert!(matches!(&operands[1], Operand::Node(n) if n.ptr_eq(&x)));
    }

    #[test]
    fn test_operator_traits_build_operations() {
        let x = deferred();
        let y = deferred();
        assert_eq!(binary_parts(&(&x * &y)).0, BinaryOp::Mul);
        assert_eq!(binary_parts(&(&x / &y)).0, BinaryOp::Div);
        assert_eq!(binary_parts(&(x.clone() + y.clone())).0, BinaryOp::Add);
        assert_eq!(binary_parts(&x.pow(Sym::from(2.0))).0, BinaryOp::Pow);
    }

    #[test]
    fn test_every_node_gets_a_fresh_id() {
        let x = deferred();
        let sq = &x * &x;
        assert_ne!(x.id(), sq.id());
        assert_eq!(x.id(), x.clone().id());
    }

    #[test]
    fn test_first_explicit_name_sticks() {
        let x = deferred().named("x").named("y");
        assert_eq!(x.name(), Some("x"));
    }

    #[test]
    fn test_empty_name_is_no_tag() {
        let x = deferred().named("");
        assert!(x.name().is_none());
        let x = x.named("x");
        assert_eq!(x.name(), Some("x"));
    }

    #[test]
    fn test_apply_function() {
        let x = deferred();
        let f = Function::<Symbolic>::new("identity", |args| Ok(args[0].clone()));
        let applied = Expr::apply(f, [&x]);
        match applied.kind() {
            NodeKind::Operation(op) => {
                assert!(matches!(op.operator(), Operator::Function(func) if func.name() == "identity"));
                assert_eq!(op.operands().len(), 1);
            }
            NodeKind::Deferred(_) => panic!("expected operation"),
        }
    }

    #[test]
    fn test_fresh_node_is_unresolved() {
        assert!(deferred().resolved().is_none());
    }
}

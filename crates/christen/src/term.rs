//! Structural arguments and their resolved form.
//!
//! Constructor arguments and scope bindings are [`Term`]s: nodes, plain values,
//! or sequences and string-keyed mappings of further terms. Resolution walks a
//! term structurally: a mapping resolves to a mapping, a sequence to a
//! sequence, a node to its materialized value, and a plain value to itself.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::domain::Domain;
use crate::expr::{Expr, Operand};

/// An argument or binding that may contain deferred nodes.
pub enum Term<D: Domain> {
    Node(Expr<D>),
    Value(D::Value),
    Seq(Vec<Term<D>>),
    Map(IndexMap<String, Term<D>>),
}

impl<D: Domain> Term<D> {
    /// Wrap a plain domain value.
    pub fn value(value: D::Value) -> Self {
        Term::Value(value)
    }

    /// Build a sequence term.
    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Term<D>>,
    {
        Term::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Build a mapping term, keeping insertion order.
    pub fn map<K, T, I>(entries: I) -> Self
    where
        K: Into<String>,
        T: Into<Term<D>>,
        I: IntoIterator<Item = (K, T)>,
    {
        Term::Map(
            entries
                .into_iter()
                .map(|(key, term)| (key.into(), term.into()))
                .collect(),
        )
    }

    /// The node, if this term is one.
    pub fn as_node(&self) -> Option<&Expr<D>> {
        match self {
            Term::Node(expr) => Some(expr),
            _ => None,
        }
    }
}

impl<D: Domain> Clone for Term<D> {
    fn clone(&self) -> Self {
        match self {
            Term::Node(expr) => Term::Node(expr.clone()),
            Term::Value(value) => Term::Value(value.clone()),
            Term::Seq(items) => Term::Seq(items.clone()),
            Term::Map(entries) => Term::Map(entries.clone()),
        }
    }
}

impl<D: Domain> fmt::Debug for Term<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Node(expr) => expr.fmt(f),
            Term::Value(value) => value.fmt(f),
            Term::Seq(items) => f.debug_list().entries(items).finish(),
            Term::Map(entries) => f.debug_map().entries(entries).finish(),
        }
    }
}

impl<D: Domain> From<Expr<D>> for Term<D> {
    fn from(expr: Expr<D>) -> Self {
        Term::Node(expr)
    }
}

impl<D: Domain> From<&Expr<D>> for Term<D> {
    fn from(expr: &Expr<D>) -> Self {
        Term::Node(expr.clone())
    }
}

impl<D: Domain> From<Operand<D>> for Term<D> {
    fn from(operand: Operand<D>) -> Self {
        match operand {
            Operand::Node(expr) => Term::Node(expr),
            Operand::Value(value) => Term::Value(value),
        }
    }
}

impl<D: Domain> From<Vec<Term<D>>> for Term<D> {
    fn from(items: Vec<Term<D>>) -> Self {
        Term::Seq(items)
    }
}

impl<D: Domain> From<IndexMap<String, Term<D>>> for Term<D> {
    fn from(entries: IndexMap<String, Term<D>>) -> Self {
        Term::Map(entries)
    }
}

/// A resolved term.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolved<V> {
    Value(V),
    Seq(Vec<Resolved<V>>),
    Map(IndexMap<String, Resolved<V>>),
}

impl<V> Resolved<V> {
    /// The value, if this is a single value.
    pub fn as_value(&self) -> Option<&V> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Consume into the value, if this is a single value.
    pub fn into_value(self) -> Option<V> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The items, if this is a sequence.
    pub fn as_seq(&self) -> Option<&[Resolved<V>]> {
        match self {
            Resolved::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this is a mapping.
    pub fn as_map(&self) -> Option<&IndexMap<String, Resolved<V>>> {
        match self {
            Resolved::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

//! Explicit scope capture and the reverse context built from it.
//!
//! A [`Scope`] is the ordered list of bindings a caller wants names recovered
//! from: what the call site's local variables would be. Binding a node under a
//! name is the assignment that names it.
//!
//! ```
//! use christen::symbolic::{normal, Symbolic};
//! use christen::{Arguments, Scope};
//!
//! let mut scope = Scope::<Symbolic>::new();
//! let x = scope.bind_expr("x", normal().call(Arguments::new().arg(0.0).arg(1.0)));
//! scope.bind_expr("total", &x * &x);
//! assert_eq!(scope.len(), 2);
//! ```

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::expr::Expr;
use crate::ids::NodeId;
use crate::term::Term;

/// Tie-break when one node is bound under several names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasPolicy {
    /// The binding that comes last in scope order names the node.
    #[default]
    LastBinding,
    /// The binding that comes first in scope order names the node.
    FirstBinding,
}

/// Ordered name → term bindings.
pub struct Scope<D: Domain> {
    bindings: IndexMap<String, Term<D>>,
}

impl<D: Domain> Scope<D> {
    /// Empty scope.
    pub fn new() -> Self {
        Self {
            bindings: IndexMap::new(),
        }
    }

    /// Bind `name` to a term.
    ///
    /// Rebinding an existing name replaces its value and keeps its position,
    /// like reassigning a local variable.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Term<D>>) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Bind `name` to a node and hand the node back, so binding reads like an
    /// assignment: `let x = scope.bind_expr("x", ...)`.
    pub fn bind_expr(&mut self, name: impl Into<String>, expr: Expr<D>) -> Expr<D> {
        self.bind(name, expr.clone());
        expr
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Term<D>> {
        self.bindings.get(name)
    }

    /// Bindings in scope order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term<D>)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the scope has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<D: Domain> Default for Scope<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Domain> Clone for Scope<D> {
    fn clone(&self) -> Self {
        Self {
            bindings: self.bindings.clone(),
        }
    }
}

impl<D: Domain> std::fmt::Debug for Scope<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(&self.bindings).finish()
    }
}

impl<D: Domain, K: Into<String>, T: Into<Term<D>>> FromIterator<(K, T)> for Scope<D> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut scope = Scope::new();
        for (name, value) in iter {
            scope.bind(name, value);
        }
        scope
    }
}

/// One-shot lookup from node identity to the name it was bound under.
///
/// Only top-level node bindings contribute; nodes nested inside sequences or
/// mappings are not named by the enclosing binding.
#[derive(Debug, Clone, Default)]
pub struct ReverseContext {
    names: HashMap<NodeId, String>,
}

impl ReverseContext {
    /// Build the reverse context of a scope.
    pub fn build<D: Domain>(scope: &Scope<D>, policy: AliasPolicy) -> Self {
        let mut names = HashMap::with_capacity(scope.len());
        for (name, term) in scope.iter() {
            let Some(expr) = term.as_node() else {
                continue;
            };
            match policy {
                AliasPolicy::LastBinding => {
                    names.insert(expr.id(), name.to_string());
                }
                AliasPolicy::FirstBinding => {
                    names.entry(expr.id()).or_insert_with(|| name.to_string());
                }
            }
        }
        Self { names }
    }

    /// Name bound to a node, if any.
    pub fn name_of(&self, node: NodeId) -> Option<&str> {
        self.names.get(&node).map(String::as_str)
    }

    /// Number of named nodes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no node is named.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Arguments;
    use crate::symbolic::{Sym, Symbolic, normal};

    fn node() -> Expr<Symbolic> {
        normal().call(Arguments::new().arg(0.0).arg(1.0))
    }

    #[test]
    fn test_reverse_context_names_bound_nodes() {
        let mut scope = Scope::new();
        let x = scope.bind_expr("x", node());
        scope.bind("k", Sym::from(3.0));
        let ctx = ReverseContext::build(&scope, AliasPolicy::default());
        assert_eq!(ctx.name_of(x.id()), Some("x"));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_alias_last_binding_wins() {
        let mut scope = Scope::new();
        let x = scope.bind_expr("x", node());
        scope.bind("alias", &x);
        let ctx = ReverseContext::build(&scope, AliasPolicy::LastBinding);
        assert_eq!(ctx.name_of(x.id()), Some("alias"));
    }

    #[test]
    fn test_alias_first_binding_wins() {
        let mut scope = Scope::new();
        let x = scope.bind_expr("x", node());
        scope.bind("alias", &x);
        let ctx = ReverseContext::build(&scope, AliasPolicy::FirstBinding);
        assert_eq!(ctx.name_of(x.id()), Some("x"));
    }

    #[test]
    fn test_rebinding_keeps_position() {
        let mut scope = Scope::<Symbolic>::new();
        scope.bind("a", Sym::from(1.0));
        scope.bind("b", Sym::from(2.0));
        scope.bind("a", Sym::from(3.0));
        let names: Vec<_> = scope.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_nested_nodes_are_not_named() {
        let x = node();
        let scope: Scope<Symbolic> = [("group", Term::<Symbolic>::seq([&x]))].into_iter().collect();
        let ctx = ReverseContext::build(&scope, AliasPolicy::default());
        assert!(ctx.name_of(x.id()).is_none());
    }
}

//! Resolution pass.
//!
//! A pass takes a scope and a selection, names every deferred construction it
//! reaches, and materializes every node bottom-up.
//!
//! # What a Pass Does
//!
//! 1. **Builds the reverse context** - node id → bound name, from the scope
//! 2. **Picks the selection** - the given term, or every scope binding that
//!    is a node or a plain value of an included kind
//! 3. **Walks the selection** - mappings and sequences structurally, nodes
//!    depth-first (operands and arguments before the node itself)
//! 4. **Materializes** - applies operators, calls constructors with the
//!    recovered name, caches each result on its node
//!
//! A node is materialized at most once. Later requests, from the same pass
//! through a shared operand or from a later pass, return the cached value.
//!
//! # Naming
//!
//! A deferred construction takes its explicit tag if it has one, otherwise the
//! name it is bound under in the scope. Neither means
//! [`ResolveError::Naming`].

use std::ops::Index;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::Domain;
use crate::error::{ResolveError, Result};
use crate::expr::{Expr, NodeKind, Operand, Operator};
use crate::scope::{AliasPolicy, ReverseContext, Scope};
use crate::term::{Resolved, Term};

/// Options of a resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Kinds of plain values picked up by the default selection.
    /// `None` means [`Domain::base_kinds`].
    pub included: Option<Vec<String>>,
    /// Tie-break for nodes bound under several names.
    pub alias_policy: AliasPolicy,
}

impl ResolveOptions {
    /// Check whether a plain value belongs to the default selection.
    pub fn includes<D: Domain>(&self, value: &D::Value) -> bool {
        let kind = D::kind_of(value);
        match &self.included {
            Some(kinds) => kinds.iter().any(|k| k == kind),
            None => D::base_kinds().contains(&kind),
        }
    }
}

/// Resolved fields keyed by the selection's mapping keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record<V> {
    fields: IndexMap<String, Resolved<V>>,
}

impl<V> Record<V> {
    /// Resolved field.
    pub fn get(&self, field: &str) -> Option<&Resolved<V>> {
        self.fields.get(field)
    }

    /// Field that resolved to a single value.
    pub fn value(&self, field: &str) -> Option<&V> {
        self.get(field).and_then(Resolved::as_value)
    }

    /// Field names in selection order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in selection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolved<V>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consume into the underlying map.
    pub fn into_fields(self) -> IndexMap<String, Resolved<V>> {
        self.fields
    }
}

impl<V> Index<&str> for Record<V> {
    type Output = Resolved<V>;

    fn index(&self, field: &str) -> &Resolved<V> {
        match self.fields.get(field) {
            Some(value) => value,
            None => panic!("record has no field `{field}`"),
        }
    }
}

/// Result of a resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Model<V> {
    /// The selection was a mapping.
    Record(Record<V>),
    /// The selection was anything else.
    Single(Resolved<V>),
}

impl<V> Model<V> {
    /// The record, if the selection was a mapping.
    pub fn as_record(&self) -> Option<&Record<V>> {
        match self {
            Model::Record(record) => Some(record),
            Model::Single(_) => None,
        }
    }

    /// Consume into the record, if the selection was a mapping.
    pub fn into_record(self) -> Option<Record<V>> {
        match self {
            Model::Record(record) => Some(record),
            Model::Single(_) => None,
        }
    }

    /// Consume into the single resolved term, if the selection was not a
    /// mapping.
    pub fn into_single(self) -> Option<Resolved<V>> {
        match self {
            Model::Single(resolved) => Some(resolved),
            Model::Record(_) => None,
        }
    }

    /// Shortcut for a record field holding a single value.
    pub fn value(&self, field: &str) -> Option<&V> {
        self.as_record().and_then(|record| record.value(field))
    }
}

/// Walks terms against one reverse context.
pub struct Resolver {
    reverse: ReverseContext,
}

impl Resolver {
    /// Prepare a pass over `scope`.
    pub fn new<D: Domain>(scope: &Scope<D>, options: &ResolveOptions) -> Self {
        Self {
            reverse: ReverseContext::build(scope, options.alias_policy),
        }
    }

    /// Resolver over an already built reverse context.
    pub fn with_context(reverse: ReverseContext) -> Self {
        Self { reverse }
    }

    /// The reverse context of this pass.
    pub fn reverse_context(&self) -> &ReverseContext {
        &self.reverse
    }

    /// Resolve a term structurally.
    pub fn identify_term<D: Domain>(&self, term: &Term<D>) -> Result<Resolved<D::Value>, D::Error> {
        Ok(match term {
            Term::Node(expr) => Resolved::Value(self.identify(expr)?),
            Term::Value(value) => Resolved::Value(value.clone()),
            Term::Seq(items) => Resolved::Seq(
                items
                    .iter()
                    .map(|item| self.identify_term(item))
                    .collect::<Result<_, _>>()?,
            ),
            Term::Map(entries) => Resolved::Map(self.identify_entries(entries)?),
        })
    }

    /// Materialize a node, or return its cached value.
    pub fn identify<D: Domain>(&self, expr: &Expr<D>) -> Result<D::Value, D::Error> {
        if let Some(value) = expr.resolved() {
            trace!(node = %expr.id(), "cache hit");
            return Ok(value.clone());
        }

        let value = match expr.kind() {
            NodeKind::Operation(operation) => {
                let operands = operation
                    .operands()
                    .iter()
                    .map(|operand| self.identify_operand(operand))
                    .collect::<Result<Vec<_>, _>>()?;
                let value = apply(operation.operator(), operands)?;
                debug!(node = %expr.id(), operator = ?operation.operator(), "operation materialized");
                value
            }
            NodeKind::Deferred(deferred) => {
                let constructor = deferred.constructor();
                let name = expr
                    .name()
                    .or_else(|| self.reverse.name_of(expr.id()))
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        ResolveError::<D::Error>::naming(expr.id(), constructor.path())
                    })?;
                let arguments = deferred.arguments();
                let positional = arguments
                    .positional()
                    .iter()
                    .map(|arg| self.identify_term(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let keyword = self.identify_entries(arguments.keyword())?;
                let value = constructor
                    .invoke(name, positional, keyword)
                    .map_err(ResolveError::Domain)?;
                debug!(node = %expr.id(), name, constructor = constructor.path(), "deferred construction materialized");
                value
            }
        };

        // Nodes are acyclic, so nothing below can have filled this slot.
        let _ = expr.slot().set(value.clone());
        Ok(value)
    }

    fn identify_operand<D: Domain>(&self, operand: &Operand<D>) -> Result<D::Value, D::Error> {
        match operand {
            Operand::Node(expr) => self.identify(expr),
            Operand::Value(value) => Ok(value.clone()),
        }
    }

    fn identify_entries<D: Domain>(
        &self,
        entries: &IndexMap<String, Term<D>>,
    ) -> Result<IndexMap<String, Resolved<D::Value>>, D::Error> {
        let mut resolved = IndexMap::with_capacity(entries.len());
        for (key, term) in entries {
            resolved.insert(key.clone(), self.identify_term(term)?);
        }
        Ok(resolved)
    }
}

fn apply<D: Domain>(operator: &Operator<D>, operands: Vec<D::Value>) -> Result<D::Value, D::Error> {
    match operator {
        Operator::Binary(op) => {
            let mut operands = operands.into_iter();
            let (Some(lhs), Some(rhs), None) = (operands.next(), operands.next(), operands.next())
            else {
                unreachable!("BUG: binary operation must be built with exactly two operands");
            };
            D::binary(*op, lhs, rhs).map_err(ResolveError::Domain)
        }
        Operator::Function(function) => function.call(&operands).map_err(ResolveError::Domain),
    }
}

/// The selection used when none is given: every binding that is a node, or a
/// plain value of an included kind, in scope order.
pub fn default_selection<D: Domain>(scope: &Scope<D>, options: &ResolveOptions) -> Term<D> {
    Term::Map(
        scope
            .iter()
            .filter(|(_, term)| match term {
                Term::Node(_) => true,
                Term::Value(value) => options.includes::<D>(value),
                Term::Seq(_) | Term::Map(_) => false,
            })
            .map(|(name, term)| (name.to_string(), term.clone()))
            .collect(),
    )
}

/// Run a resolution pass.
///
/// `selection = None` resolves [`default_selection`]. A mapping selection
/// yields [`Model::Record`]; anything else yields [`Model::Single`].
///
/// # Examples
///
/// ```
/// use christen::symbolic::{normal, Sym, Symbolic};
/// use christen::{resolve, Arguments, ResolveOptions, Scope};
///
/// let mut scope = Scope::<Symbolic>::new();
/// let x = scope.bind_expr("x", normal().call(Arguments::new().arg(0.0).arg(1.0)));
/// scope.bind_expr("total", 1.0 + &x * &x);
///
/// let model = resolve(&scope, None, &ResolveOptions::default()).unwrap();
/// assert_eq!(model.value("x").map(Sym::to_string).as_deref(), Some("x"));
/// assert_eq!(model.value("total").map(Sym::to_string).as_deref(), Some("1 + x*x"));
/// ```
#[instrument(level = "debug", skip_all, fields(bindings = scope.len()))]
pub fn resolve<D: Domain>(
    scope: &Scope<D>,
    selection: Option<&Term<D>>,
    options: &ResolveOptions,
) -> Result<Model<D::Value>, D::Error> {
    let resolver = Resolver::new(scope, options);
    debug!(named = resolver.reverse_context().len(), "reverse context built");

    let resolved = match selection {
        Some(term) => resolver.identify_term(term)?,
        None => resolver.identify_term(&default_selection(scope, options))?,
    };

    Ok(match resolved {
        Resolved::Map(fields) => Model::Record(Record { fields }),
        other => Model::Single(other),
    })
}

impl<D: Domain> Scope<D> {
    /// Resolve every node and included value in this scope with default
    /// options.
    pub fn resolve(&self) -> Result<Model<D::Value>, D::Error> {
        resolve(self, None, &ResolveOptions::default())
    }
}

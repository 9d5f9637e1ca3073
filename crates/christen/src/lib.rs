//! Named-by-assignment deferred construction.
//!
//! Some libraries want a display name as the first argument of every
//! constructor: `Normal("x", 0, 1)`. Repeating the name of the variable the
//! object is bound to is noise. This crate defers those constructions: a
//! wrapped constructor returns a node instead of calling the library, nodes
//! compose with arithmetic and domain functions, and a resolution pass names
//! each pending construction after the binding that holds it, then
//! materializes every node exactly once.
//!
//! # Architecture
//!
//! ```text
//!   Wrapper::call / construct ──► Expr (Deferred)     ┐
//!   + * / pow / Expr::apply  ──► Expr (Operation)     ├── Scope (name → Term)
//!                                                      ┘        │
//!                                       ReverseContext ◄────────┤
//!                                                               ▼
//!                                           Resolver ──► Model (Record | Single)
//! ```
//!
//! - [`domain`] - the library being wrapped: values, errors, arithmetic
//! - [`expr`] - expression nodes and composition
//! - [`term`] - structural arguments and their resolved form
//! - [`deferred`] - constructors, wrappers and [`construct`]
//! - [`scope`] - explicit bindings and the reverse context built from them
//! - [`resolver`] - the resolution pass
//! - [`symbolic`] - a small symbolic domain used by the docs and tests
//!
//! # Example
//!
//! ```
//! use christen::symbolic::{normal, Symbolic};
//! use christen::{Arguments, Scope};
//!
//! let mut scope = Scope::<Symbolic>::new();
//! let x = scope.bind_expr("x", normal().call(Arguments::new().arg(0.0).arg(1.0)));
//! scope.bind_expr("total", 1.0 + &x * &x);
//!
//! let model = scope.resolve().unwrap();
//! let record = model.as_record().unwrap();
//! assert_eq!(record.names().collect::<Vec<_>>(), vec!["x", "total"]);
//! assert_eq!(record["total"].as_value().unwrap().to_string(), "1 + x*x");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod deferred;
pub mod domain;
pub mod error;
pub mod expr;
pub mod ids;
pub mod resolver;
pub mod scope;
pub mod symbolic;
pub mod term;

pub use deferred::{Arguments, Constructor, DeferredConstruction, Wrapper, construct};
pub use domain::{BinaryOp, Domain};
pub use error::ResolveError;
pub use expr::{Expr, Function, NodeKind, Operand, Operation, Operator};
pub use ids::NodeId;
pub use resolver::{Model, Record, ResolveOptions, Resolver, default_selection, resolve};
pub use scope::{AliasPolicy, ReverseContext, Scope};
pub use term::{Resolved, Term};

//! Adapter generator for libraries of named constructors.
//!
//! Given a description of a library module, writes one adapter per callable
//! whose first parameter is a display name. Each adapter takes the name as an
//! optional trailing parameter and forwards everything to the deferred
//! construction entry point, so
//!
//! ```text
//! x = Normal(0, 1)
//! ```
//!
//! builds a pending construction that a resolution pass names `x`.
//!
//! # Pipeline
//!
//! ```text
//! JSON description ──┐
//!                    ├─► SourceModule ─► Generator::render ─► Artifact ─► atomic write
//! Rust source (syn) ─┘                   (should_wrap, wrap_callable)
//! ```
//!
//! # Example
//!
//! ```
//! use christen_codegen::{Generator, SourceModule};
//!
//! let generator = Generator::default();
//! let module = SourceModule::from_rust_source(
//!     "dists",
//!     "pub fn normal(name: &str, mean: f64, std: f64) -> Dist { todo!() }",
//!     generator.config(),
//! )
//! .unwrap();
//! let artifact = generator.render(&module, None).unwrap();
//! assert!(artifact.text.contains("def normal(mean: float, std: float, name=None):"));
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod generate;
pub mod introspect;
pub mod params;
pub mod render;
pub mod schema;

pub use error::{GenerateError, Result};
pub use generate::{Artifact, GenerationReport, Generator, GeneratorConfig, Skipped, generate};
pub use params::{ParamKind, Parameter, Signature, should_wrap};
pub use render::{SkipReason, WrapperCode, wrap_callable};
pub use schema::SourceModule;

//! Generator error types.

use std::path::PathBuf;

use thiserror::Error;

/// Generator result type alias.
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Errors raised while describing a module or writing its adapters.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A parameter kind the adapter syntax cannot express.
    #[error("`{callable}`: parameter `{parameter}` has unsupported kind `{kind}`")]
    UnsupportedParameterKind {
        callable: String,
        parameter: String,
        kind: String,
    },

    /// Configuration validation failure.
    #[error("Invalid generator config: {0}")]
    InvalidConfig(String),

    /// An explicitly requested member does not exist.
    #[error("module `{module}` has no member `{name}`")]
    UnknownMember { module: String, name: String },

    /// The destination does not live under the configured package root.
    #[error("destination {destination:?} is outside package root {root:?}")]
    OutsidePackage { destination: PathBuf, root: PathBuf },

    /// Malformed module description.
    #[error("Invalid module description: {0}")]
    Schema(#[from] serde_json::Error),

    /// Rust source that does not parse.
    #[error("Invalid Rust source: {0}")]
    Syntax(#[from] syn::Error),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerateError {
    /// Create an UnsupportedParameterKind error.
    pub fn unsupported(
        callable: impl Into<String>,
        parameter: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self::UnsupportedParameterKind {
            callable: callable.into(),
            parameter: parameter.into(),
            kind: kind.into(),
        }
    }
}

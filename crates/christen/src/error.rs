//! Resolution errors

use thiserror::Error;

use crate::ids::NodeId;

/// Resolution result type
pub type Result<T, E> = std::result::Result<T, ResolveError<E>>;

/// Errors surfaced by a resolution pass.
///
/// `E` is the domain's error type. Failures raised by constructors, functions
/// and operators pass through untouched as [`ResolveError::Domain`].
#[derive(Debug, Error)]
pub enum ResolveError<E: std::error::Error + 'static> {
    /// A deferred construction reached resolution without an explicit name and
    /// without being bound in the scope.
    #[error("no name bound by assignment for deferred `{constructor}` (node {node})")]
    Naming { node: NodeId, constructor: String },

    /// The underlying library failed.
    #[error(transparent)]
    Domain(E),
}

impl<E: std::error::Error + 'static> ResolveError<E> {
    /// Create a Naming error.
    pub fn naming(node: NodeId, constructor: impl Into<String>) -> Self {
        Self::Naming {
            node,
            constructor: constructor.into(),
        }
    }

    /// Check whether this is a naming failure.
    pub fn is_naming(&self) -> bool {
        matches!(self, ResolveError::Naming { .. })
    }
}

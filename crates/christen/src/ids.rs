//! Node identities.
//!
//! Every expression node receives a process-unique id when it is built. The
//! reverse context of a resolution pass is keyed by these ids rather than by
//! pointer addresses, which may be reused once a node is dropped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of one expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate the next free id.
    pub(crate) fn fresh() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_distinct() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_display() {
        let id = NodeId(7);
        assert_eq!(id.to_string(), "#7");
    }
}

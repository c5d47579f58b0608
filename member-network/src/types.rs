//! Core types for the member network

use serde::{Deserialize, Serialize};
use std::fmt;

/// Member identifier (same identity space as the owning account)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(String);

impl MemberId {
    /// Create new member ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get as bytes (storage keys)
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A node in the invite forest
///
/// Parent, ancestors and children are id references rather than live
/// object pointers, so ancestry is a pure lookup with no cyclic
/// ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Member identity
    pub id: MemberId,

    /// The inviting member (root members have none)
    pub parent: Option<MemberId>,

    /// Ancestors from immediate parent up to root (nearest first)
    pub ancestors: Vec<MemberId>,

    /// Direct invitees, in insertion order
    pub children: Vec<MemberId>,
}

impl Member {
    /// Create a root member (no inviter)
    pub fn root(id: MemberId) -> Self {
        Self {
            id,
            parent: None,
            ancestors: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a member under an inviter
    ///
    /// `parent_ancestors` is the inviter's own ancestor chain.
    pub fn invited(id: MemberId, parent: MemberId, parent_ancestors: &[MemberId]) -> Self {
        let mut ancestors = Vec::with_capacity(parent_ancestors.len() + 1);
        ancestors.push(parent.clone());
        ancestors.extend_from_slice(parent_ancestors);

        Self {
            id,
            parent: Some(parent),
            ancestors,
            children: Vec::new(),
        }
    }

    /// Whether this member is a root of the forest
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Depth in the tree (root is 0)
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

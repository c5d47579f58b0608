//! The invite forest arena

use crate::{
    error::{Error, Result},
    types::{Member, MemberId},
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// Arena of member records indexed by id
///
/// Concurrent reads and disjoint writes proceed independently; the map
/// serializes racing creates for the same id so exactly one wins.
#[derive(Debug, Default)]
pub struct MemberNetwork {
    members: DashMap<MemberId, Member>,
}

impl MemberNetwork {
    /// Create an empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a member, optionally under an inviter
    ///
    /// Fails with [`Error::Conflict`] if the id already has a record and
    /// with [`Error::NotFound`] if an inviter id is given but unknown.
    /// The new member's ancestors are the inviter followed by the
    /// inviter's own ancestors.
    pub fn create_member(
        &self,
        inviter: Option<&MemberId>,
        id: MemberId,
    ) -> Result<Member> {
        let member = match inviter {
            Some(parent_id) => {
                // Copy the chain out so no shard guard is held across
                // the insert below
                let parent_ancestors = {
                    let parent = self
                        .members
                        .get(parent_id)
                        .ok_or_else(|| Error::NotFound(parent_id.to_string()))?;
                    parent.ancestors.clone()
                };
                Member::invited(id.clone(), parent_id.clone(), &parent_ancestors)
            }
            None => Member::root(id.clone()),
        };

        match self.members.entry(id.clone()) {
            Entry::Occupied(_) => return Err(Error::Conflict(id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(member.clone());
            }
        }

        // Link into the parent's children after releasing the entry
        // guard; members are never removed, so the parent still exists.
        if let Some(parent_id) = inviter {
            if let Some(mut parent) = self.members.get_mut(parent_id) {
                if !parent.children.contains(&id) {
                    parent.children.push(id.clone());
                }
            }
        }

        debug!(
            member_id = %member.id,
            parent_id = ?member.parent,
            depth = member.depth(),
            "Member created"
        );

        Ok(member)
    }

    /// O(1) ancestry check using the cached ancestor set
    ///
    /// Returns false when either id is unknown.
    pub fn is_ancestor_of(&self, candidate: &MemberId, member: &MemberId) -> bool {
        if !self.members.contains_key(candidate) {
            return false;
        }
        self.members
            .get(member)
            .map_or(false, |m| m.ancestors.contains(candidate))
    }

    /// Direct invitees of a member, in insertion order
    pub fn children_of(&self, id: &MemberId) -> Result<Vec<MemberId>> {
        self.members
            .get(id)
            .map(|m| m.children.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Ancestor chain of a member, nearest first up to root
    pub fn ancestors_of(&self, id: &MemberId) -> Result<Vec<MemberId>> {
        self.members
            .get(id)
            .map(|m| m.ancestors.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Get a member record by id
    pub fn get(&self, id: &MemberId) -> Option<Member> {
        self.members.get(id).map(|m| m.clone())
    }

    /// Whether a member record exists
    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.contains_key(id)
    }

    /// Number of members in the network
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the network is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Insert a member record loaded from storage
    ///
    /// Used to rebuild the arena at startup; trusts the persisted
    /// ancestors/children as-is.
    pub fn insert_loaded(&self, member: Member) {
        self.members.insert(member.id.clone(), member);
    }
}

//! Invitation collaborator contract

use dashmap::DashMap;
use member_network::MemberId;
use serde::{Deserialize, Serialize};

/// A pending invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Mobile number the invitation was sent to
    pub invited_mobile_number: String,

    /// The member who extended the invitation
    pub inviter_id: MemberId,
}

/// Lookup of pending invitations by mobile number
///
/// Owned by the invitations collaborator; this core only reads it.
pub trait InvitationDirectory: Send + Sync {
    /// Find a pending invitation for a mobile number
    fn find_by_mobile(&self, mobile_number: &str) -> Option<Invitation>;
}

/// In-memory directory for wiring and tests
#[derive(Debug, Default)]
pub struct InMemoryInvitations {
    by_mobile: DashMap<String, Invitation>,
}

impl InMemoryInvitations {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending invitation
    pub fn add(&self, invitation: Invitation) {
        self.by_mobile
            .insert(invitation.invited_mobile_number.clone(), invitation);
    }
}

impl InvitationDirectory for InMemoryInvitations {
    fn find_by_mobile(&self, mobile_number: &str) -> Option<Invitation> {
        self.by_mobile.get(mobile_number).map(|i| i.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_mobile() {
        let directory = InMemoryInvitations::new();
        directory.add(Invitation {
            invited_mobile_number: "+15550100".to_string(),
            inviter_id: MemberId::new("m1"),
        });

        let found = directory.find_by_mobile("+15550100").unwrap();
        assert_eq!(found.inviter_id, MemberId::new("m1"));

        assert!(directory.find_by_mobile("+15550199").is_none());
    }
}

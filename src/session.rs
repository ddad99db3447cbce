//! Per-session visibility of owned records.
//!
//! The caller supplies who is signed in and whether they hold the manager
//! role. These values are trusted as given.

use crate::types::{ClientInteraction, Engagement, User};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub current_user_id: Option<String>,
    pub is_manager: bool,
    /// The user record `current_user_id` names, when it is known.
    user: Option<User>,
}

impl Session {
    pub fn new(current_user_id: Option<String>, is_manager: bool) -> Self {
        Self {
            current_user_id,
            is_manager,
            user: None,
        }
    }

    /// Look up the signed-in user by id or external id, so records stamped
    /// with either one are visible.
    pub fn resolve_user(mut self, users: &[User]) -> Self {
        self.user = self.current_user_id.as_deref().and_then(|me| {
            users
                .iter()
                .find(|u| u.id == me || u.external_id == me)
                .cloned()
        });
        self
    }

    /// A manager session that sees every record.
    pub fn manager() -> Self {
        Self::new(None, true)
    }

    /// Managers see everything. Anyone else sees only records they own,
    /// and a session with no user sees nothing.
    pub fn can_see(&self, owner_user_id: Option<&str>) -> bool {
        if self.is_manager {
            return true;
        }
        match (&self.current_user_id, owner_user_id) {
            (Some(me), Some(owner)) => {
                me == owner || self.user.as_ref().is_some_and(|u| u.owns(Some(owner)))
            }
            _ => false,
        }
    }

    /// Owner to stamp on records created in this session.
    pub fn owner(&self) -> Option<String> {
        self.current_user_id.clone()
    }

    pub fn scope_engagements(&self, engagements: Vec<Engagement>) -> Vec<Engagement> {
        engagements
            .into_iter()
            .filter(|e| self.can_see(e.owner_user_id.as_deref()))
            .collect()
    }

    pub fn scope_interactions(&self, interactions: Vec<ClientInteraction>) -> Vec<ClientInteraction> {
        interactions
            .into_iter()
            .filter(|i| self.can_see(i.owner_user_id.as_deref()))
            .collect()
    }
}

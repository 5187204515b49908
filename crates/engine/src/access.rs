//! Administrator allow-list.
//!
//! The list is fixed at startup and shared read-only by every engine, so a
//! privilege check is a pure function of the actor id and this value.

use std::{collections::HashSet, sync::Arc};

use crate::{ActorId, EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Participant,
    Administrator,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Administrator)
    }
}

#[derive(Clone, Debug, Default)]
pub struct AccessPolicy {
    admins: Arc<HashSet<ActorId>>,
}

impl AccessPolicy {
    pub fn new(admins: impl IntoIterator<Item = ActorId>) -> Self {
        Self {
            admins: Arc::new(admins.into_iter().collect()),
        }
    }

    pub fn role(&self, actor_id: ActorId) -> Role {
        if self.admins.contains(&actor_id) {
            Role::Administrator
        } else {
            Role::Participant
        }
    }

    pub fn is_admin(&self, actor_id: ActorId) -> bool {
        self.role(actor_id).is_admin()
    }

    /// Fails with [`EngineError::PermissionDenied`] unless `actor_id` is an
    /// administrator.
    pub fn require_admin(&self, actor_id: ActorId, action: &str) -> ResultEngine<()> {
        if self.is_admin(actor_id) {
            return Ok(());
        }
        tracing::warn!(actor_id, action, "privileged action denied");
        Err(EngineError::PermissionDenied(format!(
            "{action} requires an administrator"
        )))
    }
}

use super::{Capability, IdentityProvider};
use crate::planning::{ProjectId, UserId};
use std::collections::HashSet;

/// In-memory grant table. Adding a membership or a capability also
/// registers the user.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    users: HashSet<UserId>,
    members: HashSet<(UserId, ProjectId)>,
    grants: HashSet<(UserId, ProjectId, Capability)>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.users.insert(user_id);
        self
    }

    pub fn with_member(mut self, user_id: UserId, project_id: ProjectId) -> Self {
        self.users.insert(user_id);
        self.members.insert((user_id, project_id));
        self
    }

    pub fn grant(mut self, user_id: UserId, project_id: ProjectId, capability: Capability) -> Self {
        self.users.insert(user_id);
        self.grants.insert((user_id, project_id, capability));
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn has_capability(
        &self,
        actor: UserId,
        project_id: ProjectId,
        capability: Capability,
    ) -> bool {
        self.grants.contains(&(actor, project_id, capability))
    }

    fn is_member(&self, actor: UserId, project_id: ProjectId) -> bool {
        self.members.contains(&(actor, project_id))
    }

    fn user_exists(&self, user_id: UserId) -> bool {
        self.users.contains(&user_id)
    }
}

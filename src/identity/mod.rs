//! Who may do what in which project.
//!
//! The host tracker owns users, projects and roles; the planner only asks
//! yes/no questions through [`IdentityProvider`].

mod static_provider;

pub use static_provider::StaticIdentityProvider;

use crate::planning::{PlanTask, ProjectId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Manage groups and edit any task of the project
    PlannerAdmin,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::PlannerAdmin => "planner_admin",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "planner_admin" => Some(Capability::PlannerAdmin),
            _ => None,
        }
    }
}

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    fn has_capability(&self, actor: UserId, project_id: ProjectId, capability: Capability)
        -> bool;

    fn is_member(&self, actor: UserId, project_id: ProjectId) -> bool;

    fn user_exists(&self, user_id: UserId) -> bool;
}

/// The owner of a task and planner admins of its project may edit it.
pub fn can_edit_task(identity: &dyn IdentityProvider, actor: UserId, task: &PlanTask) -> bool {
    task.owner_id == actor
        || identity.has_capability(actor, task.project_id, Capability::PlannerAdmin)
}

pub fn can_manage_groups(
    identity: &dyn IdentityProvider,
    actor: UserId,
    project_id: ProjectId,
) -> bool {
    identity.has_capability(actor, project_id, Capability::PlannerAdmin)
}

/// Members and planner admins may add tasks to a project.
pub fn can_create_task(
    identity: &dyn IdentityProvider,
    actor: UserId,
    project_id: ProjectId,
) -> bool {
    identity.is_member(actor, project_id)
        || identity.has_capability(actor, project_id, Capability::PlannerAdmin)
}

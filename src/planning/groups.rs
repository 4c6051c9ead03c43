use super::error::{PlannerError, ValidationErrors};
use super::models::*;
use super::store::PlannerStore;
use crate::identity::{can_manage_groups, IdentityProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Teams and groups of a project, and who belongs to them.
///
/// Every mutation requires the `planner_admin` capability on the group's
/// project.
pub struct GroupManager {
    store: Arc<dyn PlannerStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl GroupManager {
    pub fn new(store: Arc<dyn PlannerStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    pub fn get(&self, id: GroupId) -> Result<PlanGroup, PlannerError> {
        self.store
            .get_group(id)?
            .ok_or(PlannerError::NotFound { entity: "group", id })
    }

    pub fn all_project_groups(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<PlanGroup>, PlannerError> {
        Ok(self.store.list_project_groups(project_id)?)
    }

    pub fn create(
        &self,
        actor: UserId,
        project_id: ProjectId,
        mut form: GroupForm,
    ) -> Result<PlanGroup, PlannerError> {
        self.authorize(actor, project_id)?;
        form.name = form.name.trim().to_string();
        self.validate(project_id, None, &form)?;

        let group = self.store.insert_group(project_id, &form)?;
        info!(
            "User {} created {} {} ({:?}) in project {}",
            actor,
            group.group_type.label().to_lowercase(),
            group.id,
            group.name,
            project_id
        );
        Ok(group)
    }

    pub fn update(
        &self,
        actor: UserId,
        id: GroupId,
        mut form: GroupForm,
    ) -> Result<PlanGroup, PlannerError> {
        let group = self.get(id)?;
        self.authorize(actor, group.project_id)?;
        form.name = form.name.trim().to_string();
        self.validate(group.project_id, Some(id), &form)?;

        let updated = PlanGroup {
            id,
            project_id: group.project_id,
            name: form.name,
            group_type: form.group_type,
            leader_id: form.leader_id,
            parent_group: form.parent_group,
        };
        self.store.update_group(&updated)?;
        Ok(updated)
    }

    /// Delete a group together with its memberships. Child groups become
    /// root groups.
    pub fn delete(&self, actor: UserId, id: GroupId) -> Result<(), PlannerError> {
        let group = self.get(id)?;
        self.authorize(actor, group.project_id)?;
        self.store.delete_group(id)?;
        info!("User {} deleted group {}", actor, id);
        Ok(())
    }

    /// Add the given users to the group, skipping those already in it.
    /// Returns the full membership list.
    pub fn add_members(
        &self,
        actor: UserId,
        group_id: GroupId,
        user_ids: &[UserId],
    ) -> Result<Vec<PlanGroupMember>, PlannerError> {
        let group = self.get(group_id)?;
        self.authorize(actor, group.project_id)?;

        let mut errors = ValidationErrors::new();
        for user_id in user_ids {
            if !self.identity.user_exists(*user_id) {
                errors.add("user", format!("{} does not exist", user_id));
            }
        }
        errors.into_result()?;

        let members = self.store.add_group_members(group_id, user_ids)?;
        debug!("Group {} has {} member(s)", group_id, members.len());
        Ok(members)
    }

    /// Remove one membership. Removing a membership that does not exist is
    /// not an error.
    pub fn remove_member(
        &self,
        actor: UserId,
        group_id: GroupId,
        membership_id: MembershipId,
    ) -> Result<(), PlannerError> {
        let group = self.get(group_id)?;
        self.authorize(actor, group.project_id)?;
        if !self.store.remove_group_member(group_id, membership_id)? {
            debug!(
                "Membership {} not found in group {}, nothing to remove",
                membership_id, group_id
            );
        }
        Ok(())
    }

    pub fn members(&self, group_id: GroupId) -> Result<Vec<PlanGroupMember>, PlannerError> {
        Ok(self.store.list_group_members(group_id)?)
    }

    /// The candidates that are not members of the group yet, in input order.
    pub fn non_members(
        &self,
        group_id: GroupId,
        candidates: &[UserId],
    ) -> Result<Vec<UserId>, PlannerError> {
        let members: HashSet<UserId> = self
            .store
            .list_group_members(group_id)?
            .into_iter()
            .map(|m| m.user_id)
            .collect();
        Ok(candidates
            .iter()
            .copied()
            .filter(|id| !members.contains(id))
            .collect())
    }

    /// Leader of the first team (lowest group id) of the project that counts
    /// `user_id` among its members and has a leader.
    pub fn team_leader_for(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<UserId>, PlannerError> {
        Ok(self.store.find_team_leader(project_id, user_id)?)
    }

    fn authorize(&self, actor: UserId, project_id: ProjectId) -> Result<(), PlannerError> {
        if can_manage_groups(self.identity.as_ref(), actor, project_id) {
            Ok(())
        } else {
            Err(PlannerError::Forbidden {
                actor,
                action: "manage groups",
            })
        }
    }

    fn validate(
        &self,
        project_id: ProjectId,
        current: Option<GroupId>,
        form: &GroupForm,
    ) -> Result<(), PlannerError> {
        let mut errors = ValidationErrors::new();
        if form.name.is_empty() {
            errors.add("name", "can't be blank");
        }
        if let Some(leader_id) = form.leader_id {
            if !self.identity.user_exists(leader_id) {
                errors.add("leader", "does not exist");
            }
        }
        if let Some(parent) = form.parent_group {
            self.check_parent(project_id, current, parent, &mut errors)?;
        }
        errors.into_result()
    }

    /// The parent must be in the same project and must not be the group
    /// itself or one of its descendants.
    fn check_parent(
        &self,
        project_id: ProjectId,
        current: Option<GroupId>,
        parent: GroupId,
        errors: &mut ValidationErrors,
    ) -> Result<(), PlannerError> {
        let mut next = Some(parent);
        let mut seen = HashSet::new();
        while let Some(id) = next {
            if Some(id) == current {
                errors.add("parent_group", "can't be the group itself or a subgroup");
                return Ok(());
            }
            if !seen.insert(id) {
                break;
            }
            match self.store.get_group(id)? {
                Some(group) if group.project_id == project_id => next = group.parent_group,
                Some(_) => {
                    errors.add("parent_group", "must belong to the same project");
                    return Ok(());
                }
                None => {
                    errors.add("parent_group", "does not exist");
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

use super::error::{PlannerError, ValidationErrors};
use super::models::*;
use super::store::PlannerStore;
use crate::identity::{can_create_task, can_edit_task, IdentityProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

const TAKEN: &str = "has already been taken";

/// Task CRUD with ownership checks.
pub struct TaskManager {
    store: Arc<dyn PlannerStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl TaskManager {
    pub fn new(store: Arc<dyn PlannerStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    pub fn get(&self, id: TaskId) -> Result<PlanTask, PlannerError> {
        self.store
            .get_task(id)?
            .ok_or(PlannerError::NotFound { entity: "task", id })
    }

    pub fn create(
        &self,
        actor: UserId,
        project_id: ProjectId,
        mut new_task: NewPlanTask,
    ) -> Result<PlanTask, PlannerError> {
        if !can_create_task(self.identity.as_ref(), actor, project_id) {
            return Err(PlannerError::Forbidden {
                actor,
                action: "create tasks",
            });
        }

        new_task.name = new_task.name.trim().to_string();
        let mut errors = ValidationErrors::new();
        self.check_name(project_id, &new_task.name, None, &mut errors)?;
        if !self.identity.user_exists(new_task.owner_id) {
            errors.add("owner", "does not exist");
        }
        if let Some(parent) = new_task.parent_task {
            self.check_parent(project_id, parent, None, &mut errors)?;
        }
        errors.into_result()?;

        let task = self.store.insert_task(project_id, &new_task)?;
        info!(
            "User {} created task {} ({:?}) in project {}",
            actor, task.id, task.name, project_id
        );
        Ok(task)
    }

    pub fn update(
        &self,
        actor: UserId,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<PlanTask, PlannerError> {
        let mut task = self.get(id)?;
        if !self.can_edit(actor, &task) {
            return Err(PlannerError::Forbidden {
                actor,
                action: "edit this task",
            });
        }

        let mut errors = ValidationErrors::new();
        if let Some(name) = changes.name {
            task.name = name.trim().to_string();
            self.check_name(task.project_id, &task.name, Some(id), &mut errors)?;
        }
        if let Some(owner_id) = changes.owner_id {
            if self.identity.user_exists(owner_id) {
                task.owner_id = owner_id;
            } else {
                errors.add("owner", "does not exist");
            }
        }
        if let Some(parent) = changes.parent_task {
            self.check_parent(task.project_id, parent, Some(id), &mut errors)?;
            task.parent_task = Some(parent);
        }
        if let Some(is_open) = changes.is_open {
            task.is_open = is_open;
        }
        if let Some(task_type) = changes.task_type {
            task.task_type = task_type;
        }
        if let Some(description) = changes.description {
            task.description = Some(description);
        }
        if let Some(wbs) = changes.wbs {
            task.wbs = Some(wbs);
        }
        errors.into_result()?;

        self.store.update_task(&task)?;
        Ok(task)
    }

    /// Fails with `DeleteRestricted` while any request references the task.
    pub fn delete(&self, id: TaskId) -> Result<(), PlannerError> {
        self.store.delete_task(id)?;
        info!("Deleted task {}", id);
        Ok(())
    }

    pub fn can_edit(&self, actor: UserId, task: &PlanTask) -> bool {
        can_edit_task(self.identity.as_ref(), actor, task)
    }

    pub fn can_delete(&self, id: TaskId) -> Result<bool, PlannerError> {
        Ok(self.store.count_task_requests(id)? == 0)
    }

    pub fn all_project_tasks(&self, project_id: ProjectId) -> Result<Vec<PlanTask>, PlannerError> {
        Ok(self.store.list_project_tasks(project_id)?)
    }

    fn check_name(
        &self,
        project_id: ProjectId,
        name: &str,
        current: Option<TaskId>,
        errors: &mut ValidationErrors,
    ) -> Result<(), PlannerError> {
        if name.is_empty() {
            errors.add("name", "can't be blank");
            return Ok(());
        }
        if let Some(existing) = self.store.find_task_by_name(project_id, name)? {
            if Some(existing.id) != current {
                errors.add("name", TAKEN);
            }
        }
        Ok(())
    }

    fn check_parent(
        &self,
        project_id: ProjectId,
        parent: TaskId,
        current: Option<TaskId>,
        errors: &mut ValidationErrors,
    ) -> Result<(), PlannerError> {
        let mut next = Some(parent);
        let mut seen = HashSet::new();
        while let Some(id) = next {
            if Some(id) == current {
                errors.add("parent_task", "can't be the task itself or a subtask");
                return Ok(());
            }
            if !seen.insert(id) {
                break;
            }
            match self.store.get_task(id)? {
                Some(task) if task.project_id == project_id => next = task.parent_task,
                Some(_) => {
                    errors.add("parent_task", "must belong to the same project");
                    return Ok(());
                }
                None => {
                    errors.add("parent_task", "does not exist");
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

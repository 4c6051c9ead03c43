//! Planner storage trait.

use super::models::*;
use anyhow::Result;
use chrono::NaiveDate;

/// Hook run inside the storage transaction after a request change has been
/// written and before it is committed. An error aborts the change.
pub type BeforeCommit<'a, T> = &'a dyn Fn(&T) -> Result<()>;

/// Persistence for tasks, requests, details and groups.
///
/// Referential rules are enforced here regardless of the backing engine:
/// task names are unique per project, a task cannot be deleted while a
/// request points at it, and deleting a group or a request takes its
/// memberships or details with it.
pub trait PlannerStore: Send + Sync {
    // === Tasks ===

    /// Insert a task. Fails if the name is already taken in the project.
    fn insert_task(&self, project_id: ProjectId, task: &NewPlanTask) -> Result<PlanTask>;

    fn get_task(&self, id: TaskId) -> Result<Option<PlanTask>>;

    fn find_task_by_name(&self, project_id: ProjectId, name: &str) -> Result<Option<PlanTask>>;

    fn update_task(&self, task: &PlanTask) -> Result<()>;

    /// Delete a task. Fails with `StoreError::DeleteRestricted` while any
    /// request references it and with `StoreError::NotFound` if absent.
    fn delete_task(&self, id: TaskId) -> Result<()>;

    /// Tasks of a project, ascending id.
    fn list_project_tasks(&self, project_id: ProjectId) -> Result<Vec<PlanTask>>;

    /// Number of requests referencing a task.
    fn count_task_requests(&self, task_id: TaskId) -> Result<usize>;

    // === Requests ===

    /// Insert a request. The `id` field of the argument is ignored; the
    /// stored request is returned with its assigned id.
    fn insert_request(&self, request: &PlanRequest) -> Result<PlanRequest>;

    fn get_request(&self, id: RequestId) -> Result<Option<PlanRequest>>;

    /// Overwrite every attribute of an existing request.
    fn update_request(&self, request: &PlanRequest) -> Result<()>;

    /// Overwrite a request and run `before_commit` in the same transaction.
    fn update_request_with(
        &self,
        request: &PlanRequest,
        before_commit: BeforeCommit<'_, PlanRequest>,
    ) -> Result<()>;

    /// Delete the details of a request, then the request itself, running
    /// `before_commit` before the transaction is committed.
    fn delete_request_with(
        &self,
        id: RequestId,
        before_commit: BeforeCommit<'_, DeletedRequest>,
    ) -> Result<DeletedRequest>;

    /// Requests whose task belongs to the project, ascending id.
    fn list_project_requests(&self, project_id: ProjectId) -> Result<Vec<PlanRequest>>;

    /// New or ready requests where `user_id` plays `role`, ascending id.
    fn list_open_requests(&self, role: RequestRole, user_id: UserId) -> Result<Vec<PlanRequest>>;

    /// Project owning the task of a request.
    fn request_project(&self, request_id: RequestId) -> Result<Option<ProjectId>>;

    // === Details ===

    fn insert_detail(
        &self,
        request_id: RequestId,
        week_start: NaiveDate,
        percentage: i32,
    ) -> Result<PlanDetail>;

    /// Details of a request, ordered by week.
    fn list_request_details(&self, request_id: RequestId) -> Result<Vec<PlanDetail>>;

    /// Returns false if the detail did not exist.
    fn delete_detail(&self, id: DetailId) -> Result<bool>;

    // === Groups ===

    fn insert_group(&self, project_id: ProjectId, form: &GroupForm) -> Result<PlanGroup>;

    fn get_group(&self, id: GroupId) -> Result<Option<PlanGroup>>;

    fn update_group(&self, group: &PlanGroup) -> Result<()>;

    /// Delete a group and its memberships. Returns false if it did not exist.
    fn delete_group(&self, id: GroupId) -> Result<bool>;

    /// Groups of a project, ascending id.
    fn list_project_groups(&self, project_id: ProjectId) -> Result<Vec<PlanGroup>>;

    /// Add memberships for the users that are not members yet, in one
    /// transaction. Returns the resulting membership list.
    fn add_group_members(
        &self,
        group_id: GroupId,
        user_ids: &[UserId],
    ) -> Result<Vec<PlanGroupMember>>;

    /// Remove one membership of a group. Returns false if it did not exist.
    fn remove_group_member(&self, group_id: GroupId, membership_id: MembershipId)
        -> Result<bool>;

    /// Memberships of a group, ascending id.
    fn list_group_members(&self, group_id: GroupId) -> Result<Vec<PlanGroupMember>>;

    fn membership_exists(&self, membership_id: MembershipId) -> Result<bool>;

    /// Leader of the first team (ascending group id) of the project that has
    /// `user_id` as a member and a leader assigned.
    fn find_team_leader(&self, project_id: ProjectId, user_id: UserId) -> Result<Option<UserId>>;
}

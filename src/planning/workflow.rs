//! Request workflow.
//!
//! ```text
//! New --send--> Ready --approve/deny--> Approved | Denied
//!                 ^                                  |
//!                 +--------------send----------------+
//! ```
//!
//! Every transition is written in one store transaction and the matching
//! notification is sent before that transaction commits.

use super::error::{NotificationError, PlannerError, ValidationErrors};
use super::models::*;
use super::store::PlannerStore;
use crate::identity::IdentityProvider;
use crate::notifications::Notifier;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

const NOT_IN_LIST: &str = "is not included in the list";
const BLANK: &str = "can't be blank";
const MISSING: &str = "does not exist";

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn not_sendable(request: &PlanRequest) -> PlannerError {
    PlannerError::InvalidState {
        expected: format!(
            "{} or {}",
            RequestStatus::New.label(),
            RequestStatus::Denied.label()
        ),
        actual: request.status_string().to_string(),
    }
}

fn notification_failure(err: anyhow::Error) -> anyhow::Error {
    NotificationError(err).into()
}

pub struct RequestWorkflow {
    store: Arc<dyn PlannerStore>,
    notifier: Arc<dyn Notifier>,
    identity: Arc<dyn IdentityProvider>,
}

impl RequestWorkflow {
    pub fn new(
        store: Arc<dyn PlannerStore>,
        notifier: Arc<dyn Notifier>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            notifier,
            identity,
        }
    }

    pub fn get(&self, id: RequestId) -> Result<PlanRequest, PlannerError> {
        self.store
            .get_request(id)?
            .ok_or(PlannerError::NotFound {
                entity: "request",
                id,
            })
    }

    /// Create a request in status `New`. Every attribute is checked and all
    /// failures are reported together.
    pub fn create(&self, new: NewPlanRequest) -> Result<PlanRequest, PlannerError> {
        let mut errors = ValidationErrors::new();

        let priority = RequestPriority::from_i32(new.priority);
        if priority.is_none() {
            errors.add("priority", NOT_IN_LIST);
        }
        let resource_id = self.check_resource(new.resource_id, &mut errors);
        let task_id = self.check_task(new.task_id, &mut errors)?;

        let (Some(priority), Some(resource_id), Some(task_id)) = (priority, resource_id, task_id)
        else {
            return Err(PlannerError::Validation(errors));
        };

        let request = PlanRequest {
            id: 0,
            requester_id: new.requester_id,
            resource_id,
            approver_id: None,
            task_id,
            req_type: new.req_type,
            priority,
            description: new.description,
            status: RequestStatus::New,
            requested_on: None,
            approved_on: None,
            approver_notes: None,
        };
        let request = self.store.insert_request(&request)?;
        info!(
            "User {} created request {} for user {} on task {}",
            request.requester_id, request.id, request.resource_id, request.task_id
        );
        Ok(request)
    }

    /// Apply attribute changes to a request. Status and priority codes are
    /// checked independently, so both can be reported at once.
    ///
    /// The status is never written here: only `send_request` and
    /// `approve_or_deny` move a request, so a status code other than the
    /// current one is rejected with `InvalidState`. Resource and task can only
    /// change while the request can still be sent, because the approver was
    /// chosen for them.
    pub fn update(
        &self,
        id: RequestId,
        changes: RequestChanges,
    ) -> Result<PlanRequest, PlannerError> {
        let original = self.get(id)?;
        let mut request = original.clone();
        let mut errors = ValidationErrors::new();

        let mut target_status = None;
        if let Some(code) = changes.status {
            match RequestStatus::from_i32(code) {
                Some(status) => target_status = Some(status),
                None => errors.add("status", NOT_IN_LIST),
            }
        }
        if let Some(code) = changes.priority {
            match RequestPriority::from_i32(code) {
                Some(priority) => request.priority = priority,
                None => errors.add("priority", NOT_IN_LIST),
            }
        }
        if changes.resource_id.is_some() {
            if let Some(resource_id) = self.check_resource(changes.resource_id, &mut errors) {
                request.resource_id = resource_id;
            }
        }
        if changes.task_id.is_some() {
            if let Some(task_id) = self.check_task(changes.task_id, &mut errors)? {
                request.task_id = task_id;
            }
        }
        if let Some(req_type) = changes.req_type {
            request.req_type = req_type;
        }
        if let Some(description) = changes.description {
            request.description = Some(description);
        }

        errors.into_result()?;

        if let Some(status) = target_status.filter(|status| *status != request.status) {
            return Err(PlannerError::InvalidState {
                expected: request.status_string().to_string(),
                actual: status.label().to_string(),
            });
        }
        let rerouted =
            request.resource_id != original.resource_id || request.task_id != original.task_id;
        if rerouted && !original.can_request() {
            return Err(not_sendable(&original));
        }

        self.store.update_request(&request)?;
        debug!("Updated request {}", id);
        Ok(request)
    }

    /// Route a new or denied request to the leader of a team the resource
    /// belongs to. The approver is notified before the change commits.
    pub fn send_request(&self, id: RequestId) -> Result<PlanRequest, PlannerError> {
        let mut request = self.get(id)?;
        if !request.can_request() {
            return Err(not_sendable(&request));
        }

        let project_id = self
            .store
            .request_project(id)?
            .ok_or(PlannerError::NotFound {
                entity: "task",
                id: request.task_id,
            })?;
        let Some(approver_id) = self
            .store
            .find_team_leader(project_id, request.resource_id)?
        else {
            warn!(
                "No team leader for user {} in project {}, request {} not sent",
                request.resource_id, project_id, id
            );
            return Err(PlannerError::NoLeader {
                resource_id: request.resource_id,
                project_id,
            });
        };

        request.approver_id = Some(approver_id);
        request.requested_on = Some(now());
        request.status = RequestStatus::Ready;

        self.store.update_request_with(&request, &|sent| {
            self.notifier
                .notify_submitted(sent)
                .map_err(notification_failure)
        })?;
        info!("Request {} sent to approver {}", id, approver_id);
        Ok(request)
    }

    /// Record the approver's decision on a ready request and tell the
    /// requester. Notes are stored verbatim.
    pub fn approve_or_deny(
        &self,
        id: RequestId,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<PlanRequest, PlannerError> {
        let mut request = self.get(id)?;
        if !request.can_approve() {
            return Err(PlannerError::InvalidState {
                expected: RequestStatus::Ready.label().to_string(),
                actual: request.status_string().to_string(),
            });
        }

        request.status = decision.status();
        request.approved_on = Some(now());
        request.approver_notes = notes;

        self.store.update_request_with(&request, &|decided| {
            self.notifier
                .notify_decision(decided)
                .map_err(notification_failure)
        })?;
        info!("Request {} {}", id, request.status_string().to_lowercase());
        Ok(request)
    }

    /// Delete a request and its details. The requester is only notified when
    /// the request had no details.
    pub fn destroy(&self, id: RequestId) -> Result<DeletedRequest, PlannerError> {
        let deleted = self.store.delete_request_with(id, &|deleted| {
            if deleted.details_deleted == 0 {
                self.notifier
                    .notify_deleted(&deleted.request)
                    .map_err(notification_failure)
            } else {
                Ok(())
            }
        })?;
        info!(
            "Deleted request {} ({} detail(s))",
            id, deleted.details_deleted
        );
        Ok(deleted)
    }

    pub fn add_detail(
        &self,
        request_id: RequestId,
        week_start: NaiveDate,
        percentage: i32,
    ) -> Result<PlanDetail, PlannerError> {
        self.get(request_id)?;
        let mut errors = ValidationErrors::new();
        if !(0..=100).contains(&percentage) {
            errors.add("percentage", "must be between 0 and 100");
        }
        errors.into_result()?;
        Ok(self.store.insert_detail(request_id, week_start, percentage)?)
    }

    /// Details of a request, ordered by week.
    pub fn details(&self, request_id: RequestId) -> Result<Vec<PlanDetail>, PlannerError> {
        Ok(self.store.list_request_details(request_id)?)
    }

    pub fn remove_detail(&self, detail_id: DetailId) -> Result<bool, PlannerError> {
        Ok(self.store.delete_detail(detail_id)?)
    }

    pub fn all_project_requests(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<PlanRequest>, PlannerError> {
        Ok(self.store.list_project_requests(project_id)?)
    }

    pub fn all_open_requests_requester(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PlanRequest>, PlannerError> {
        Ok(self
            .store
            .list_open_requests(RequestRole::Requester, user_id)?)
    }

    pub fn all_open_requests_approver(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PlanRequest>, PlannerError> {
        Ok(self.store.list_open_requests(RequestRole::Approver, user_id)?)
    }

    /// Open requests asking for `user_id`'s time.
    pub fn all_open_requests_requestee(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PlanRequest>, PlannerError> {
        Ok(self.store.list_open_requests(RequestRole::Resource, user_id)?)
    }

    fn check_resource(
        &self,
        resource_id: Option<UserId>,
        errors: &mut ValidationErrors,
    ) -> Option<UserId> {
        match resource_id {
            None => {
                errors.add("resource", BLANK);
                None
            }
            Some(id) if !self.identity.user_exists(id) => {
                errors.add("resource", MISSING);
                None
            }
            Some(id) => Some(id),
        }
    }

    fn check_task(
        &self,
        task_id: Option<TaskId>,
        errors: &mut ValidationErrors,
    ) -> Result<Option<TaskId>, PlannerError> {
        let Some(id) = task_id else {
            errors.add("task", BLANK);
            return Ok(None);
        };
        if self.store.get_task(id)?.is_none() {
            errors.add("task", MISSING);
            return Ok(None);
        }
        Ok(Some(id))
    }
}

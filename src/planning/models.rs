//! Planning data models.
//!
//! Tasks, requests (with their per-week details) and groups. Status, priority
//! and group type are persisted as integer codes; the enums here own the
//! code mapping and the display labels.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type ProjectId = i64;
pub type TaskId = i64;
pub type RequestId = i64;
pub type DetailId = i64;
pub type GroupId = i64;
pub type MembershipId = i64;

/// Workflow status of a planning request.
///
/// `New --send--> Ready --decide--> Approved | Denied`, and a denied request
/// may be sent again. `Approved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    New,
    Ready,
    Approved,
    Denied,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::New,
        RequestStatus::Ready,
        RequestStatus::Approved,
        RequestStatus::Denied,
    ];

    pub fn as_i32(self) -> i32 {
        match self {
            RequestStatus::New => 0,
            RequestStatus::Ready => 1,
            RequestStatus::Approved => 2,
            RequestStatus::Denied => 3,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(RequestStatus::New),
            1 => Some(RequestStatus::Ready),
            2 => Some(RequestStatus::Approved),
            3 => Some(RequestStatus::Denied),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestStatus::New => "New",
            RequestStatus::Ready => "Ready",
            RequestStatus::Approved => "Approved",
            RequestStatus::Denied => "Denied",
        }
    }

    /// Label for a raw status code, empty for codes outside the enum.
    pub fn label_for(value: i32) -> &'static str {
        Self::from_i32(value).map(Self::label).unwrap_or("")
    }

    /// New and ready requests are still waiting on someone.
    pub fn is_open(self) -> bool {
        matches!(self, RequestStatus::New | RequestStatus::Ready)
    }
}

/// Priority of a planning request, persisted as 1 (lowest) to 5 (highest).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RequestPriority {
    Lowest = 1,
    Low = 2,
    #[default]
    Normal = 3,
    High = 4,
    Highest = 5,
}

impl RequestPriority {
    pub const ALL: [RequestPriority; 5] = [
        RequestPriority::Lowest,
        RequestPriority::Low,
        RequestPriority::Normal,
        RequestPriority::High,
        RequestPriority::Highest,
    ];

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(RequestPriority::Lowest),
            2 => Some(RequestPriority::Low),
            3 => Some(RequestPriority::Normal),
            4 => Some(RequestPriority::High),
            5 => Some(RequestPriority::Highest),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestPriority::Lowest => "Lowest",
            RequestPriority::Low => "Low",
            RequestPriority::Normal => "Normal",
            RequestPriority::High => "High",
            RequestPriority::Highest => "Highest",
        }
    }

    /// Label for a raw priority code, empty for codes outside the enum.
    pub fn label_for(value: i32) -> &'static str {
        Self::from_i32(value).map(Self::label).unwrap_or("")
    }

    /// `(label, code)` pairs for a priority picker, lowest first.
    pub fn select_options() -> Vec<(&'static str, i32)> {
        Self::ALL.iter().map(|p| (p.label(), p.as_i32())).collect()
    }
}

/// Outcome an approver can give to a ready request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    pub fn status(self) -> RequestStatus {
        match self {
            Decision::Approved => RequestStatus::Approved,
            Decision::Denied => RequestStatus::Denied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    #[default]
    Team,
    Group,
}

impl GroupType {
    pub fn as_i32(self) -> i32 {
        match self {
            GroupType::Team => 0,
            GroupType::Group => 1,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(GroupType::Team),
            1 => Some(GroupType::Group),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupType::Team => "Team",
            GroupType::Group => "Group",
        }
    }
}

/// A unit of plannable work inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTask {
    pub id: TaskId,
    pub project_id: ProjectId,
    /// Unique within the project
    pub name: String,
    pub is_open: bool,
    pub task_type: i32,
    pub owner_id: UserId,
    pub description: Option<String>,
    /// Work-breakdown-structure code
    pub wbs: Option<String>,
    pub parent_task: Option<TaskId>,
}

/// Attributes for a task that does not exist yet.
#[derive(Debug, Clone, Default)]
pub struct NewPlanTask {
    pub name: String,
    pub owner_id: UserId,
    pub task_type: i32,
    pub description: Option<String>,
    pub wbs: Option<String>,
    pub parent_task: Option<TaskId>,
}

impl NewPlanTask {
    pub fn new(name: impl Into<String>, owner_id: UserId) -> Self {
        Self {
            name: name.into(),
            owner_id,
            ..Default::default()
        }
    }
}

/// Partial update of a task; `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub name: Option<String>,
    pub is_open: Option<bool>,
    pub task_type: Option<i32>,
    pub owner_id: Option<UserId>,
    pub description: Option<String>,
    pub wbs: Option<String>,
    pub parent_task: Option<TaskId>,
}

/// A request for a resource's time on a task, routed to an approver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub id: RequestId,
    pub requester_id: UserId,
    /// The user whose time is being requested
    pub resource_id: UserId,
    /// Set when the request is sent
    pub approver_id: Option<UserId>,
    pub task_id: TaskId,
    pub req_type: i32,
    pub priority: RequestPriority,
    pub description: Option<String>,
    pub status: RequestStatus,
    /// Unix timestamp of the last send
    pub requested_on: Option<i64>,
    /// Unix timestamp of the approve/deny decision
    pub approved_on: Option<i64>,
    pub approver_notes: Option<String>,
}

impl PlanRequest {
    pub fn status_string(&self) -> &'static str {
        self.status.label()
    }

    pub fn priority_string(&self) -> &'static str {
        self.priority.label()
    }

    /// Editable once it has left the initial state. Ownership of the task
    /// plays no part here; see `TaskManager::can_edit` for that.
    pub fn can_edit(&self) -> bool {
        self.status != RequestStatus::New
    }

    pub fn can_request(&self) -> bool {
        matches!(self.status, RequestStatus::New | RequestStatus::Denied)
    }

    pub fn can_approve(&self) -> bool {
        self.status == RequestStatus::Ready
    }
}

/// Attributes of a request about to be created. Codes are raw so that
/// out-of-range input is reported as a validation error rather than lost.
#[derive(Debug, Clone)]
pub struct NewPlanRequest {
    pub requester_id: UserId,
    pub resource_id: Option<UserId>,
    pub task_id: Option<TaskId>,
    pub req_type: i32,
    pub priority: i32,
    pub description: Option<String>,
}

impl NewPlanRequest {
    pub fn new(requester_id: UserId, resource_id: UserId, task_id: TaskId) -> Self {
        Self {
            requester_id,
            resource_id: Some(resource_id),
            task_id: Some(task_id),
            req_type: 0,
            priority: RequestPriority::default().as_i32(),
            description: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a request; `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default)]
pub struct RequestChanges {
    pub resource_id: Option<UserId>,
    pub task_id: Option<TaskId>,
    pub req_type: Option<i32>,
    pub priority: Option<i32>,
    pub status: Option<i32>,
    pub description: Option<String>,
}

/// Share of the resource's time booked for one week of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDetail {
    pub id: DetailId,
    pub request_id: RequestId,
    pub week_start: NaiveDate,
    /// 0..=100
    pub percentage: i32,
}

/// A request that was removed, together with the number of details that
/// went with it.
#[derive(Debug, Clone)]
pub struct DeletedRequest {
    pub request: PlanRequest,
    pub details_deleted: usize,
}

/// Which side of a request a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRole {
    Requester,
    Approver,
    Resource,
}

impl RequestRole {
    pub fn column(self) -> &'static str {
        match self {
            RequestRole::Requester => "requester_id",
            RequestRole::Approver => "approver_id",
            RequestRole::Resource => "resource_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanGroup {
    pub id: GroupId,
    pub project_id: ProjectId,
    pub name: String,
    pub group_type: GroupType,
    pub leader_id: Option<UserId>,
    /// `None` for root groups
    pub parent_group: Option<GroupId>,
}

/// Editable attributes of a group, used for both create and update.
#[derive(Debug, Clone)]
pub struct GroupForm {
    pub name: String,
    pub group_type: GroupType,
    pub leader_id: Option<UserId>,
    pub parent_group: Option<GroupId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanGroupMember {
    pub id: MembershipId,
    pub plan_group_id: GroupId,
    pub user_id: UserId,
}

//! Project planning: tasks, resource requests and their approval workflow,
//! and the teams that route requests to approvers.

mod error;
mod groups;
mod models;
mod schema;
mod sqlite_planner_store;
mod store;
mod tasks;
mod workflow;

pub use error::{FieldError, NotificationError, PlannerError, StoreError, ValidationErrors};
pub use groups::GroupManager;
pub use models::*;
pub use schema::PLANNER_VERSIONED_SCHEMAS;
pub use sqlite_planner_store::SqlitePlannerStore;
pub use store::{BeforeCommit, PlannerStore};
pub use tasks::TaskManager;
pub use workflow::RequestWorkflow;

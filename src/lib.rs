//! Project planning for an issue tracker
//!
//! Tasks, resource requests routed to team leaders for approval, and the
//! teams and groups that make the routing possible.

pub mod config;
pub mod identity;
pub mod notifications;
pub mod planning;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use identity::{Capability, IdentityProvider, StaticIdentityProvider};
pub use notifications::{Notifier, RecordingNotifier, SqliteMailOutbox};
pub use planning::{
    GroupManager, PlannerError, PlannerStore, RequestWorkflow, SqlitePlannerStore, TaskManager,
};

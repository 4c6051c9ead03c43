//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestPlanner, REQUEST_2_ID};
//!
//! #[test]
//! fn test_send_request() {
//!     let planner = TestPlanner::new();
//!     let request = planner.workflow.send_request(REQUEST_2_ID).unwrap();
//!     assert_eq!(planner.notifier.count(), 1);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::create_test_planner_db;

use planner::planning::{GroupManager, RequestWorkflow, SqlitePlannerStore, TaskManager};
use planner::{Capability, RecordingNotifier, StaticIdentityProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// The fixture identities: users 1 to 4 are members of project 1, user 2
/// is also a member of project 2. Nobody is a planner admin.
#[allow(dead_code)]
pub fn fixture_identity() -> StaticIdentityProvider {
    StaticIdentityProvider::new()
        .with_member(USER_1, PROJECT_1)
        .with_member(USER_2, PROJECT_1)
        .with_member(USER_3, PROJECT_1)
        .with_member(USER_4, PROJECT_1)
        .with_member(USER_2, PROJECT_2)
}

/// A fixture planner database with the managers wired to a recording
/// notifier. The database is deleted when this is dropped.
#[allow(dead_code)]
pub struct TestPlanner {
    pub store: Arc<SqlitePlannerStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub workflow: RequestWorkflow,
    pub tasks: TaskManager,
    pub groups: GroupManager,
    pub db_path: PathBuf,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestPlanner {
    pub fn new() -> Self {
        Self::with_identity(fixture_identity())
    }

    /// Fixture planner where `admin` holds `planner_admin` on project 1.
    pub fn with_admin(admin: i64) -> Self {
        Self::with_identity(fixture_identity().grant(admin, PROJECT_1, Capability::PlannerAdmin))
    }

    pub fn with_identity(identity: StaticIdentityProvider) -> Self {
        let (temp_dir, db_path) = create_test_planner_db().expect("Failed to create fixture db");
        let store =
            Arc::new(SqlitePlannerStore::new(&db_path).expect("Failed to open fixture db"));
        let notifier = Arc::new(RecordingNotifier::default());
        let identity = Arc::new(identity);

        Self {
            workflow: RequestWorkflow::new(store.clone(), notifier.clone(), identity.clone()),
            tasks: TaskManager::new(store.clone(), identity.clone()),
            groups: GroupManager::new(store.clone(), identity),
            store,
            notifier,
            db_path,
            _temp_dir: temp_dir,
        }
    }

    pub fn db_dir(&self) -> PathBuf {
        self._temp_dir.path().to_path_buf()
    }
}

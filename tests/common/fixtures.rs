//! Fixture database creation
//!
//! Records are inserted with explicit ids through direct SQL so that tests
//! can refer to them by the constants in `constants.rs`.

use super::constants::*;
use anyhow::Result;
use planner::planning::SqlitePlannerStore;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// (id, project, name, owner)
const TASKS: &[(i64, i64, &str, i64)] = &[
    (TASK_1_ID, PROJECT_1, TASK_1_NAME, USER_1),
    (TASK_2_ID, PROJECT_1, "Task 2", USER_2),
    (TASK_3_ID, PROJECT_1, "Task 3", USER_1),
    (TASK_4_ID, PROJECT_2, "Task 4", USER_2),
];

/// (id, requester, resource, approver, task, status)
const REQUESTS: &[(i64, i64, i64, Option<i64>, i64, i32)] = &[
    (REQUEST_1_ID, USER_2, USER_1, None, TASK_1_ID, 0),
    (REQUEST_2_ID, USER_1, USER_2, None, TASK_2_ID, 0),
    (REQUEST_3_ID, USER_2, USER_3, Some(USER_1), TASK_2_ID, 1),
    (REQUEST_5_ID, USER_2, USER_3, Some(USER_1), TASK_3_ID, 3),
    (REQUEST_6_ID, USER_1, USER_3, Some(USER_1), TASK_3_ID, 1),
    (REQUEST_7_ID, USER_1, USER_4, None, TASK_3_ID, 0),
];

/// (id, request, week start, percentage)
const DETAILS: &[(i64, i64, &str, i32)] = &[
    (1, REQUEST_2_ID, "2024-03-04", 50),
    (2, REQUEST_2_ID, "2024-03-11", 25),
    (3, REQUEST_3_ID, "2024-03-04", 100),
];

/// (id, name, type, leader, parent)
const GROUPS: &[(i64, &str, i32, Option<i64>, Option<i64>)] = &[
    (GROUP_A_ID, "Team A", 0, Some(USER_1), None),
    (GROUP_B_ID, "Group B", 1, Some(USER_2), Some(GROUP_A_ID)),
    (GROUP_C_ID, "Team C", 0, None, None),
];

/// (id, group, user)
const MEMBERS: &[(i64, i64, i64)] = &[
    (MEMBERSHIP_A_USER_2, GROUP_A_ID, USER_2),
    (MEMBERSHIP_A_USER_3, GROUP_A_ID, USER_3),
    (3, GROUP_B_ID, USER_1),
    (4, GROUP_C_ID, USER_4),
];

/// Creates a temporary directory holding a populated planner.db.
/// Returns (temp_dir, planner_db_path)
pub fn create_test_planner_db() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("planner.db");
    populate(&db_path)?;
    Ok((dir, db_path))
}

fn populate(db_path: &Path) -> Result<()> {
    // Initialize the store (creates schema)
    drop(SqlitePlannerStore::new(db_path)?);

    let mut conn = Connection::open(db_path)?;
    let tx = conn.transaction()?;

    for (id, project, name, owner) in TASKS {
        tx.execute(
            "INSERT INTO plan_tasks (id, project_id, name, owner_id) VALUES (?1, ?2, ?3, ?4)",
            params![id, project, name, owner],
        )?;
    }
    for (id, requester, resource, approver, task, status) in REQUESTS {
        tx.execute(
            r#"INSERT INTO plan_requests (id, requester_id, resource_id, approver_id, task_id, status)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![id, requester, resource, approver, task, status],
        )?;
    }
    for (id, request, week, percentage) in DETAILS {
        tx.execute(
            "INSERT INTO plan_details (id, request_id, week_start, percentage) VALUES (?1, ?2, ?3, ?4)",
            params![id, request, week, percentage],
        )?;
    }
    for (id, name, group_type, leader, parent) in GROUPS {
        tx.execute(
            r#"INSERT INTO plan_groups (id, project_id, name, group_type, leader_id, parent_group)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![id, PROJECT_1, name, group_type, leader, parent],
        )?;
    }
    for (id, group, user) in MEMBERS {
        tx.execute(
            "INSERT INTO plan_group_members (id, plan_group_id, user_id) VALUES (?1, ?2, ?3)",
            params![id, group, user],
        )?;
    }

    tx.commit()?;
    Ok(())
}

//! Database schema for planner.db.
//!
//! Version 0 holds tasks, requests and groups. Version 1 adds the per-week
//! request details.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};
use anyhow::Result;
use rusqlite::Connection;

const PARENT_TASK_FK: ForeignKey = ForeignKey {
    foreign_table: "plan_tasks",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

/// Requests keep their task alive.
const REQUEST_TASK_FK: ForeignKey = ForeignKey {
    foreign_table: "plan_tasks",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const DETAIL_REQUEST_FK: ForeignKey = ForeignKey {
    foreign_table: "plan_requests",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const PARENT_GROUP_FK: ForeignKey = ForeignKey {
    foreign_table: "plan_groups",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const MEMBER_GROUP_FK: ForeignKey = ForeignKey {
    foreign_table: "plan_groups",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

pub const PLAN_TASKS_TABLE_V_0: Table = Table {
    name: "plan_tasks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("project_id", &SqlType::Integer, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "is_open",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "task_type",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("owner_id", &SqlType::Integer, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("wbs", &SqlType::Text),
        sqlite_column!(
            "parent_task",
            &SqlType::Integer,
            foreign_key = Some(&PARENT_TASK_FK)
        ),
    ],
    indices: &[("idx_plan_tasks_project", "project_id")],
    unique_constraints: &[&["project_id", "name"]],
};

pub const PLAN_REQUESTS_TABLE_V_0: Table = Table {
    name: "plan_requests",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("requester_id", &SqlType::Integer, non_null = true),
        sqlite_column!("resource_id", &SqlType::Integer, non_null = true),
        sqlite_column!("approver_id", &SqlType::Integer),
        sqlite_column!(
            "task_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&REQUEST_TASK_FK)
        ),
        sqlite_column!(
            "req_type",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "priority",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("3")
        ),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!(
            "status",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("requested_on", &SqlType::Integer),
        sqlite_column!("approved_on", &SqlType::Integer),
        sqlite_column!("approver_notes", &SqlType::Text),
    ],
    indices: &[
        ("idx_plan_requests_task", "task_id"),
        ("idx_plan_requests_requester", "requester_id, status"),
        ("idx_plan_requests_approver", "approver_id, status"),
        ("idx_plan_requests_resource", "resource_id, status"),
    ],
    unique_constraints: &[],
};

pub const PLAN_GROUPS_TABLE_V_0: Table = Table {
    name: "plan_groups",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("project_id", &SqlType::Integer, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "group_type",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("leader_id", &SqlType::Integer),
        sqlite_column!(
            "parent_group",
            &SqlType::Integer,
            foreign_key = Some(&PARENT_GROUP_FK)
        ),
    ],
    indices: &[("idx_plan_groups_project", "project_id")],
    unique_constraints: &[],
};

pub const PLAN_GROUP_MEMBERS_TABLE_V_0: Table = Table {
    name: "plan_group_members",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "plan_group_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MEMBER_GROUP_FK)
        ),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_plan_group_members_user", "user_id")],
    unique_constraints: &[&["plan_group_id", "user_id"]],
};

pub const PLAN_DETAILS_TABLE_V_1: Table = Table {
    name: "plan_details",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "request_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&DETAIL_REQUEST_FK)
        ),
        sqlite_column!("week_start", &SqlType::Text, non_null = true),
        sqlite_column!("percentage", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_plan_details_request", "request_id")],
    unique_constraints: &[],
};

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    PLAN_DETAILS_TABLE_V_1.create(conn)
}

pub const PLANNER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            PLAN_TASKS_TABLE_V_0,
            PLAN_REQUESTS_TABLE_V_0,
            PLAN_GROUPS_TABLE_V_0,
            PLAN_GROUP_MEMBERS_TABLE_V_0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            PLAN_TASKS_TABLE_V_0,
            PLAN_REQUESTS_TABLE_V_0,
            PLAN_GROUPS_TABLE_V_0,
            PLAN_GROUP_MEMBERS_TABLE_V_0,
            PLAN_DETAILS_TABLE_V_1,
        ],
        migration: Some(migrate_v0_to_v1),
    },
];

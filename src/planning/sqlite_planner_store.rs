//! SQLite-backed planner store.

use super::error::StoreError;
use super::models::*;
use super::schema::PLANNER_VERSIONED_SCHEMAS;
use super::store::{BeforeCommit, PlannerStore};
use crate::sqlite_persistence::open_versioned;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

const WEEK_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct SqlitePlannerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlannerStore {
    /// Open the planner database at `db_path`, creating or migrating it as
    /// needed.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned(db_path, PLANNER_VERSIONED_SCHEMAS, "planner")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store with the latest schema.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        PLANNER_VERSIONED_SCHEMAS
            .last()
            .context("No schemas defined")?
            .create(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn invalid_code(column: &str, value: i32) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Integer,
            format!("invalid {} code {}", column, value).into(),
        )
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<PlanTask> {
        Ok(PlanTask {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            name: row.get("name")?,
            is_open: row.get("is_open")?,
            task_type: row.get("task_type")?,
            owner_id: row.get("owner_id")?,
            description: row.get("description")?,
            wbs: row.get("wbs")?,
            parent_task: row.get("parent_task")?,
        })
    }

    fn row_to_request(row: &rusqlite::Row) -> rusqlite::Result<PlanRequest> {
        let status: i32 = row.get("status")?;
        let priority: i32 = row.get("priority")?;
        Ok(PlanRequest {
            id: row.get("id")?,
            requester_id: row.get("requester_id")?,
            resource_id: row.get("resource_id")?,
            approver_id: row.get("approver_id")?,
            task_id: row.get("task_id")?,
            req_type: row.get("req_type")?,
            priority: RequestPriority::from_i32(priority)
                .ok_or_else(|| Self::invalid_code("priority", priority))?,
            description: row.get("description")?,
            status: RequestStatus::from_i32(status)
                .ok_or_else(|| Self::invalid_code("status", status))?,
            requested_on: row.get("requested_on")?,
            approved_on: row.get("approved_on")?,
            approver_notes: row.get("approver_notes")?,
        })
    }

    fn row_to_detail(row: &rusqlite::Row) -> rusqlite::Result<PlanDetail> {
        let week: String = row.get("week_start")?;
        let week_start = NaiveDate::parse_from_str(&week, WEEK_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        Ok(PlanDetail {
            id: row.get("id")?,
            request_id: row.get("request_id")?,
            week_start,
            percentage: row.get("percentage")?,
        })
    }

    fn row_to_group(row: &rusqlite::Row) -> rusqlite::Result<PlanGroup> {
        let group_type: i32 = row.get("group_type")?;
        Ok(PlanGroup {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            name: row.get("name")?,
            group_type: GroupType::from_i32(group_type)
                .ok_or_else(|| Self::invalid_code("group_type", group_type))?,
            leader_id: row.get("leader_id")?,
            parent_group: row.get("parent_group")?,
        })
    }

    fn row_to_member(row: &rusqlite::Row) -> rusqlite::Result<PlanGroupMember> {
        Ok(PlanGroupMember {
            id: row.get("id")?,
            plan_group_id: row.get("plan_group_id")?,
            user_id: row.get("user_id")?,
        })
    }

    fn query_request(conn: &Connection, id: RequestId) -> Result<Option<PlanRequest>> {
        let request = conn
            .query_row(
                "SELECT * FROM plan_requests WHERE id = ?1",
                [id],
                Self::row_to_request,
            )
            .optional()?;
        Ok(request)
    }

    fn write_request(conn: &Connection, request: &PlanRequest) -> Result<usize> {
        let changed = conn.execute(
            r#"UPDATE plan_requests SET
                requester_id = ?2, resource_id = ?3, approver_id = ?4, task_id = ?5,
                req_type = ?6, priority = ?7, description = ?8, status = ?9,
                requested_on = ?10, approved_on = ?11, approver_notes = ?12
               WHERE id = ?1"#,
            params![
                request.id,
                request.requester_id,
                request.resource_id,
                request.approver_id,
                request.task_id,
                request.req_type,
                request.priority.as_i32(),
                request.description,
                request.status.as_i32(),
                request.requested_on,
                request.approved_on,
                request.approver_notes,
            ],
        )?;
        Ok(changed)
    }

    fn list_members(conn: &Connection, group_id: GroupId) -> Result<Vec<PlanGroupMember>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM plan_group_members WHERE plan_group_id = ?1 ORDER BY id ASC",
        )?;
        let members = stmt
            .query_map([group_id], Self::row_to_member)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }

    fn group_exists(conn: &Connection, group_id: GroupId) -> Result<bool> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM plan_groups WHERE id = ?1",
                [group_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }
}

impl PlannerStore for SqlitePlannerStore {
    // === Tasks ===

    fn insert_task(&self, project_id: ProjectId, task: &NewPlanTask) -> Result<PlanTask> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"INSERT INTO plan_tasks (
                project_id, name, is_open, task_type, owner_id, description, wbs, parent_task
            ) VALUES (?1, ?2, 1, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                project_id,
                task.name,
                task.task_type,
                task.owner_id,
                task.description,
                task.wbs,
                task.parent_task,
            ],
        )
        .with_context(|| format!("Failed to insert task {:?}", task.name))?;
        let id = conn.last_insert_rowid();
        debug!("Inserted task {} in project {}", id, project_id);

        Ok(PlanTask {
            id,
            project_id,
            name: task.name.clone(),
            is_open: true,
            task_type: task.task_type,
            owner_id: task.owner_id,
            description: task.description.clone(),
            wbs: task.wbs.clone(),
            parent_task: task.parent_task,
        })
    }

    fn get_task(&self, id: TaskId) -> Result<Option<PlanTask>> {
        let conn = self.conn.lock().unwrap();
        let task = conn
            .query_row(
                "SELECT * FROM plan_tasks WHERE id = ?1",
                [id],
                Self::row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    fn find_task_by_name(&self, project_id: ProjectId, name: &str) -> Result<Option<PlanTask>> {
        let conn = self.conn.lock().unwrap();
        let task = conn
            .query_row(
                "SELECT * FROM plan_tasks WHERE project_id = ?1 AND name = ?2",
                params![project_id, name],
                Self::row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    fn update_task(&self, task: &PlanTask) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            r#"UPDATE plan_tasks SET
                name = ?2, is_open = ?3, task_type = ?4, owner_id = ?5,
                description = ?6, wbs = ?7, parent_task = ?8
               WHERE id = ?1"#,
            params![
                task.id,
                task.name,
                task.is_open,
                task.task_type,
                task.owner_id,
                task.description,
                task.wbs,
                task.parent_task,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "task",
                id: task.id,
            }
            .into());
        }
        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let exists = tx
            .query_row("SELECT 1 FROM plan_tasks WHERE id = ?1", [id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::NotFound { entity: "task", id }.into());
        }

        let dependents: i64 = tx.query_row(
            "SELECT COUNT(*) FROM plan_requests WHERE task_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        if dependents > 0 {
            return Err(StoreError::DeleteRestricted {
                entity: "task",
                id,
                dependents: dependents as usize,
            }
            .into());
        }

        tx.execute("DELETE FROM plan_tasks WHERE id = ?1", [id])?;
        tx.commit()?;
        debug!("Deleted task {}", id);
        Ok(())
    }

    fn list_project_tasks(&self, project_id: ProjectId) -> Result<Vec<PlanTask>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM plan_tasks WHERE project_id = ?1 ORDER BY id ASC")?;
        let tasks = stmt
            .query_map([project_id], Self::row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    fn count_task_requests(&self, task_id: TaskId) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM plan_requests WHERE task_id = ?1",
            [task_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // === Requests ===

    fn insert_request(&self, request: &PlanRequest) -> Result<PlanRequest> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"INSERT INTO plan_requests (
                requester_id, resource_id, approver_id, task_id, req_type, priority,
                description, status, requested_on, approved_on, approver_notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                request.requester_id,
                request.resource_id,
                request.approver_id,
                request.task_id,
                request.req_type,
                request.priority.as_i32(),
                request.description,
                request.status.as_i32(),
                request.requested_on,
                request.approved_on,
                request.approver_notes,
            ],
        )
        .context("Failed to insert request")?;

        let mut stored = request.clone();
        stored.id = conn.last_insert_rowid();
        debug!("Inserted request {} on task {}", stored.id, stored.task_id);
        Ok(stored)
    }

    fn get_request(&self, id: RequestId) -> Result<Option<PlanRequest>> {
        let conn = self.conn.lock().unwrap();
        Self::query_request(&conn, id)
    }

    fn update_request(&self, request: &PlanRequest) -> Result<()> {
        self.update_request_with(request, &|_| Ok(()))
    }

    fn update_request_with(
        &self,
        request: &PlanRequest,
        before_commit: BeforeCommit<'_, PlanRequest>,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if Self::write_request(&tx, request)? == 0 {
            return Err(StoreError::NotFound {
                entity: "request",
                id: request.id,
            }
            .into());
        }
        before_commit(request)?;
        tx.commit().map_err(|err| {
            warn!(
                "Commit of request {} failed after its notification was sent: {}",
                request.id, err
            );
            err
        })?;
        Ok(())
    }

    fn delete_request_with(
        &self,
        id: RequestId,
        before_commit: BeforeCommit<'_, DeletedRequest>,
    ) -> Result<DeletedRequest> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let request = Self::query_request(&tx, id)?
            .ok_or(StoreError::NotFound { entity: "request", id })?;

        let details_deleted = tx.execute("DELETE FROM plan_details WHERE request_id = ?1", [id])?;
        tx.execute("DELETE FROM plan_requests WHERE id = ?1", [id])?;

        let deleted = DeletedRequest {
            request,
            details_deleted,
        };
        before_commit(&deleted)?;
        tx.commit().map_err(|err| {
            warn!(
                "Commit of request {} deletion failed after its notification was sent: {}",
                id, err
            );
            err
        })?;
        debug!(
            "Deleted request {} with {} detail(s)",
            id, deleted.details_deleted
        );
        Ok(deleted)
    }

    fn list_project_requests(&self, project_id: ProjectId) -> Result<Vec<PlanRequest>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"SELECT r.* FROM plan_requests r
               JOIN plan_tasks t ON t.id = r.task_id
               WHERE t.project_id = ?1
               ORDER BY r.id ASC"#,
        )?;
        let requests = stmt
            .query_map([project_id], Self::row_to_request)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(requests)
    }

    fn list_open_requests(&self, role: RequestRole, user_id: UserId) -> Result<Vec<PlanRequest>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM plan_requests WHERE {} = ?1 AND status IN (?2, ?3) ORDER BY id ASC",
            role.column()
        ))?;
        let requests = stmt
            .query_map(
                params![
                    user_id,
                    RequestStatus::New.as_i32(),
                    RequestStatus::Ready.as_i32()
                ],
                Self::row_to_request,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(requests)
    }

    fn request_project(&self, request_id: RequestId) -> Result<Option<ProjectId>> {
        let conn = self.conn.lock().unwrap();
        let project = conn
            .query_row(
                r#"SELECT t.project_id FROM plan_requests r
                   JOIN plan_tasks t ON t.id = r.task_id
                   WHERE r.id = ?1"#,
                [request_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(project)
    }

    // === Details ===

    fn insert_detail(
        &self,
        request_id: RequestId,
        week_start: NaiveDate,
        percentage: i32,
    ) -> Result<PlanDetail> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO plan_details (request_id, week_start, percentage) VALUES (?1, ?2, ?3)",
            params![
                request_id,
                week_start.format(WEEK_FORMAT).to_string(),
                percentage
            ],
        )
        .with_context(|| format!("Failed to insert detail for request {}", request_id))?;

        Ok(PlanDetail {
            id: conn.last_insert_rowid(),
            request_id,
            week_start,
            percentage,
        })
    }

    fn list_request_details(&self, request_id: RequestId) -> Result<Vec<PlanDetail>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM plan_details WHERE request_id = ?1 ORDER BY week_start ASC, id ASC",
        )?;
        let details = stmt
            .query_map([request_id], Self::row_to_detail)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(details)
    }

    fn delete_detail(&self, id: DetailId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM plan_details WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    // === Groups ===

    fn insert_group(&self, project_id: ProjectId, form: &GroupForm) -> Result<PlanGroup> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"INSERT INTO plan_groups (project_id, name, group_type, leader_id, parent_group)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                project_id,
                form.name,
                form.group_type.as_i32(),
                form.leader_id,
                form.parent_group,
            ],
        )
        .with_context(|| format!("Failed to insert group {:?}", form.name))?;
        let id = conn.last_insert_rowid();
        debug!("Inserted group {} in project {}", id, project_id);

        Ok(PlanGroup {
            id,
            project_id,
            name: form.name.clone(),
            group_type: form.group_type,
            leader_id: form.leader_id,
            parent_group: form.parent_group,
        })
    }

    fn get_group(&self, id: GroupId) -> Result<Option<PlanGroup>> {
        let conn = self.conn.lock().unwrap();
        let group = conn
            .query_row(
                "SELECT * FROM plan_groups WHERE id = ?1",
                [id],
                Self::row_to_group,
            )
            .optional()?;
        Ok(group)
    }

    fn update_group(&self, group: &PlanGroup) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            r#"UPDATE plan_groups SET
                name = ?2, group_type = ?3, leader_id = ?4, parent_group = ?5
               WHERE id = ?1"#,
            params![
                group.id,
                group.name,
                group.group_type.as_i32(),
                group.leader_id,
                group.parent_group,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "group",
                id: group.id,
            }
            .into());
        }
        Ok(())
    }

    fn delete_group(&self, id: GroupId) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let members = tx.execute(
            "DELETE FROM plan_group_members WHERE plan_group_id = ?1",
            [id],
        )?;
        tx.execute(
            "UPDATE plan_groups SET parent_group = NULL WHERE parent_group = ?1",
            [id],
        )?;
        let deleted = tx.execute("DELETE FROM plan_groups WHERE id = ?1", [id])? > 0;
        tx.commit()?;
        if deleted {
            debug!("Deleted group {} with {} membership(s)", id, members);
        }
        Ok(deleted)
    }

    fn list_project_groups(&self, project_id: ProjectId) -> Result<Vec<PlanGroup>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM plan_groups WHERE project_id = ?1 ORDER BY id ASC")?;
        let groups = stmt
            .query_map([project_id], Self::row_to_group)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
    }

    fn add_group_members(
        &self,
        group_id: GroupId,
        user_ids: &[UserId],
    ) -> Result<Vec<PlanGroupMember>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if !Self::group_exists(&tx, group_id)? {
            return Err(StoreError::NotFound {
                entity: "group",
                id: group_id,
            }
            .into());
        }

        let mut added = 0;
        for user_id in user_ids {
            added += tx.execute(
                "INSERT OR IGNORE INTO plan_group_members (plan_group_id, user_id) VALUES (?1, ?2)",
                params![group_id, user_id],
            )?;
        }
        let members = Self::list_members(&tx, group_id)?;
        tx.commit()?;
        debug!("Added {} member(s) to group {}", added, group_id);
        Ok(members)
    }

    fn remove_group_member(
        &self,
        group_id: GroupId,
        membership_id: MembershipId,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM plan_group_members WHERE id = ?1 AND plan_group_id = ?2",
            params![membership_id, group_id],
        )?;
        Ok(changed > 0)
    }

    fn list_group_members(&self, group_id: GroupId) -> Result<Vec<PlanGroupMember>> {
        let conn = self.conn.lock().unwrap();
        Self::list_members(&conn, group_id)
    }

    fn membership_exists(&self, membership_id: MembershipId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let exists = conn
            .query_row(
                "SELECT 1 FROM plan_group_members WHERE id = ?1",
                [membership_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    fn find_team_leader(&self, project_id: ProjectId, user_id: UserId) -> Result<Option<UserId>> {
        let conn = self.conn.lock().unwrap();
        let leader = conn
            .query_row(
                r#"SELECT g.leader_id FROM plan_groups g
                   JOIN plan_group_members m ON m.plan_group_id = g.id
                   WHERE g.project_id = ?1 AND g.group_type = ?2 AND m.user_id = ?3
                     AND g.leader_id IS NOT NULL
                   ORDER BY g.id ASC
                   LIMIT 1"#,
                params![project_id, GroupType::Team.as_i32(), user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(leader)
    }
}

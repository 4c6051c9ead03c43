//! Mail outbox kept in its own SQLite database.
//!
//! The outbox is written from inside planner transactions, so it must never
//! share the planner connection. Delivery is left to an external transport
//! that polls [`SqliteMailOutbox::pending`] and acknowledges with
//! [`SqliteMailOutbox::mark_delivered`].

use super::models::{MailKind, OutboxMessage, PlannerMail};
use super::notifier::Notifier;
use crate::config::MailSettings;
use crate::planning::PlanRequest;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::{Context, Result};
use rusqlite::{params, types::Type, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const MAIL_OUTBOX_TABLE_V_0: Table = Table {
    name: "mail_outbox",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("kind", &SqlType::Text, non_null = true),
        sqlite_column!("sender", &SqlType::Text, non_null = true),
        sqlite_column!("recipient_id", &SqlType::Integer, non_null = true),
        sqlite_column!("subject", &SqlType::Text, non_null = true),
        sqlite_column!("body", &SqlType::Text, non_null = true),
        sqlite_column!("request_id", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("delivered_at", &SqlType::Integer),
    ],
    indices: &[("idx_mail_outbox_delivered", "delivered_at")],
    unique_constraints: &[],
};

pub const MAIL_OUTBOX_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[MAIL_OUTBOX_TABLE_V_0],
    migration: None,
}];

pub struct SqliteMailOutbox {
    conn: Arc<Mutex<Connection>>,
    settings: MailSettings,
}

impl SqliteMailOutbox {
    pub fn new<P: AsRef<Path>>(db_path: P, settings: MailSettings) -> Result<Self> {
        let conn = open_versioned(db_path, MAIL_OUTBOX_VERSIONED_SCHEMAS, "mail outbox")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            settings,
        })
    }

    pub fn in_memory(settings: MailSettings) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        MAIL_OUTBOX_VERSIONED_SCHEMAS
            .last()
            .context("No schemas defined")?
            .create(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            settings,
        })
    }

    /// Queue a mail for delivery.
    pub fn enqueue(&self, mail: &PlannerMail) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"INSERT INTO mail_outbox (kind, sender, recipient_id, subject, body, request_id)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                mail.kind.as_str(),
                mail.sender,
                mail.recipient_id,
                mail.subject,
                mail.body,
                mail.request_id,
            ],
        )
        .context("Failed to queue mail")?;
        let id = conn.last_insert_rowid();
        info!(
            "Queued {} mail {} for user {} (request {})",
            mail.kind.as_str(),
            id,
            mail.recipient_id,
            mail.request_id
        );
        Ok(id)
    }

    /// Undelivered mail, oldest first.
    pub fn pending(&self) -> Result<Vec<OutboxMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM mail_outbox WHERE delivered_at IS NULL ORDER BY id ASC",
        )?;
        let messages = stmt
            .query_map([], Self::row_to_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Returns false if the message does not exist or was already delivered.
    pub fn mark_delivered(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().timestamp();
        let changed = conn.execute(
            "UPDATE mail_outbox SET delivered_at = ?1 WHERE id = ?2 AND delivered_at IS NULL",
            params![now, id],
        )?;
        if changed > 0 {
            debug!("Marked mail {} delivered", id);
        }
        Ok(changed > 0)
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<OutboxMessage> {
        let kind: String = row.get("kind")?;
        let kind = MailKind::from_str(&kind).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                format!("invalid mail kind {}", kind).into(),
            )
        })?;
        Ok(OutboxMessage {
            id: row.get("id")?,
            mail: PlannerMail {
                kind,
                sender: row.get("sender")?,
                recipient_id: row.get("recipient_id")?,
                subject: row.get("subject")?,
                body: row.get("body")?,
                request_id: row.get("request_id")?,
            },
            created_at: row.get("created_at")?,
            delivered_at: row.get("delivered_at")?,
        })
    }
}

impl Notifier for SqliteMailOutbox {
    fn notify_submitted(&self, request: &PlanRequest) -> Result<()> {
        self.enqueue(&PlannerMail::submitted(request, &self.settings)?)?;
        Ok(())
    }

    fn notify_decision(&self, request: &PlanRequest) -> Result<()> {
        self.enqueue(&PlannerMail::decision(request, &self.settings))?;
        Ok(())
    }

    fn notify_deleted(&self, request: &PlanRequest) -> Result<()> {
        self.enqueue(&PlannerMail::deleted(request, &self.settings))?;
        Ok(())
    }
}

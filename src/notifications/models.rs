//! Planner mail models

use crate::config::MailSettings;
use crate::planning::{PlanRequest, RequestId, UserId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailKind {
    /// Sent to the approver when a request becomes ready
    RequestSubmitted,
    /// Sent to the requester once the approver decided
    RequestDecision,
    /// Sent to the requester when a request without details is deleted
    RequestDeleted,
}

impl MailKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MailKind::RequestSubmitted => "request_submitted",
            MailKind::RequestDecision => "request_decision",
            MailKind::RequestDeleted => "request_deleted",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "request_submitted" => Some(MailKind::RequestSubmitted),
            "request_decision" => Some(MailKind::RequestDecision),
            "request_deleted" => Some(MailKind::RequestDeleted),
            _ => None,
        }
    }
}

/// A composed mail, ready to be queued or recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerMail {
    pub kind: MailKind,
    pub sender: String,
    pub recipient_id: UserId,
    pub subject: String,
    pub body: String,
    pub request_id: RequestId,
}

impl PlannerMail {
    /// Mail to the approver of a request that was just sent.
    pub fn submitted(request: &PlanRequest, settings: &MailSettings) -> Result<Self> {
        let approver_id = request
            .approver_id
            .with_context(|| format!("Request {} has no approver", request.id))?;

        let mut body = format!(
            "User {} asks for the time of user {} on task {}.\n\nPriority: {}\n",
            request.requester_id,
            request.resource_id,
            request.task_id,
            request.priority_string()
        );
        if let Some(description) = &request.description {
            body.push_str(&format!("\n{}\n", description));
        }
        push_link(&mut body, request.id, settings);

        Ok(Self {
            kind: MailKind::RequestSubmitted,
            sender: settings.from_address.clone(),
            recipient_id: approver_id,
            subject: format!(
                "{} Planning request #{} awaits your approval",
                settings.subject_prefix, request.id
            ),
            body,
            request_id: request.id,
        })
    }

    /// Mail to the requester carrying the approver's decision and notes.
    pub fn decision(request: &PlanRequest, settings: &MailSettings) -> Self {
        let outcome = request.status_string().to_lowercase();
        let mut body = format!("Your planning request #{} was {}.\n", request.id, outcome);
        if let Some(notes) = &request.approver_notes {
            body.push_str(&format!("\nNotes:\n{}\n", notes));
        }
        push_link(&mut body, request.id, settings);

        Self {
            kind: MailKind::RequestDecision,
            sender: settings.from_address.clone(),
            recipient_id: request.requester_id,
            subject: format!(
                "{} Planning request #{} {}",
                settings.subject_prefix, request.id, outcome
            ),
            body,
            request_id: request.id,
        }
    }

    /// Mail to the requester of a request that no longer exists.
    pub fn deleted(request: &PlanRequest, settings: &MailSettings) -> Self {
        Self {
            kind: MailKind::RequestDeleted,
            sender: settings.from_address.clone(),
            recipient_id: request.requester_id,
            subject: format!(
                "{} Planning request #{} deleted",
                settings.subject_prefix, request.id
            ),
            body: format!(
                "Your planning request #{} for user {} on task {} was deleted.\n",
                request.id, request.resource_id, request.task_id
            ),
            request_id: request.id,
        }
    }
}

fn push_link(body: &mut String, request_id: RequestId, settings: &MailSettings) {
    if let Some(base_url) = &settings.base_url {
        body.push_str(&format!("\n{}/plan_requests/{}\n", base_url, request_id));
    }
}

/// A mail stored in the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: i64,
    pub mail: PlannerMail,
    pub created_at: i64,
    pub delivered_at: Option<i64>,
}

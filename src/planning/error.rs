use std::fmt;
use thiserror::Error;

/// Failures raised by the persistence layer that callers need to tell apart
/// from plain I/O or SQL errors. They travel inside `anyhow::Error` and are
/// recovered by downcasting.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot delete {entity} {id}: {dependents} dependent record(s) exist")]
    DeleteRestricted {
        entity: &'static str,
        id: i64,
        dependents: usize,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

/// A notifier failure raised while a state change was still uncommitted.
#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotificationError(#[source] pub anyhow::Error);

/// A single failed attribute check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every attribute check that failed for one record. Fields are checked
/// independently, so several may fail at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn messages(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), PlannerError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PlannerError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{} {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Errors returned by the planning managers and the request workflow.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("No team leader found for user {resource_id} in project {project_id}")]
    NoLeader {
        resource_id: i64,
        project_id: i64,
    },

    #[error("Invalid request state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Cannot delete {entity} {id}: {dependents} dependent record(s) exist")]
    DeleteRestricted {
        entity: &'static str,
        id: i64,
        dependents: usize,
    },

    #[error("User {actor} is not allowed to {action}")]
    Forbidden { actor: i64, action: &'static str },

    #[error("Notification error: {0}")]
    Notification(anyhow::Error),

    #[error("Store error: {0}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for PlannerError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<StoreError>() {
            Ok(StoreError::DeleteRestricted {
                entity,
                id,
                dependents,
            }) => {
                return PlannerError::DeleteRestricted {
                    entity,
                    id,
                    dependents,
                }
            }
            Ok(StoreError::NotFound { entity, id }) => {
                return PlannerError::NotFound { entity, id }
            }
            Err(err) => err,
        };
        match err.downcast::<NotificationError>() {
            Ok(NotificationError(inner)) => PlannerError::Notification(inner),
            Err(err) => PlannerError::Store(err),
        }
    }
}

impl From<ValidationErrors> for PlannerError {
    fn from(errors: ValidationErrors) -> Self {
        PlannerError::Validation(errors)
    }
}

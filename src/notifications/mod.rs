//! Planner mail: composition, the notifier seam and the outbox.

mod models;
mod notifier;
mod outbox;

pub use models::{MailKind, OutboxMessage, PlannerMail};
#[cfg(feature = "mock")]
pub use notifier::MockNotifier;
pub use notifier::{Notifier, RecordingNotifier};
pub use outbox::{SqliteMailOutbox, MAIL_OUTBOX_VERSIONED_SCHEMAS};

//! Notification seam used by the request workflow.

use super::models::PlannerMail;
use crate::config::MailSettings;
use crate::planning::PlanRequest;
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Receives one call per qualifying request transition.
///
/// Calls happen while the transition is still uncommitted: returning an
/// error rolls it back. Implementations must not call back into the
/// planner store.
///
/// Delivery is at least once. A notifier that writes to its own storage,
/// like `SqliteMailOutbox`, keeps what it wrote even when the transition
/// is rolled back afterwards, either by a later error or by a failed
/// commit. Consumers of queued mail should re-read the request before
/// acting on it.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait Notifier: Send + Sync {
    /// The request was sent and now waits on its approver.
    fn notify_submitted(&self, request: &PlanRequest) -> Result<()>;

    /// The approver approved or denied the request.
    fn notify_decision(&self, request: &PlanRequest) -> Result<()>;

    /// The request was deleted.
    fn notify_deleted(&self, request: &PlanRequest) -> Result<()>;
}

/// Keeps every composed mail in memory.
pub struct RecordingNotifier {
    settings: MailSettings,
    deliveries: Mutex<Vec<PlannerMail>>,
    failing: AtomicBool,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new(MailSettings::default())
    }
}

impl RecordingNotifier {
    pub fn new(settings: MailSettings) -> Self {
        Self {
            settings,
            deliveries: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn deliveries(&self) -> Vec<PlannerMail> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.deliveries.lock().unwrap().clear();
    }

    /// While set, every notification fails and nothing is recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, mail: PlannerMail) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("Mail delivery unavailable");
        }
        self.deliveries.lock().unwrap().push(mail);
        Ok(())
    }
}

impl Notifier for RecordingNotifier {
    fn notify_submitted(&self, request: &PlanRequest) -> Result<()> {
        self.record(PlannerMail::submitted(request, &self.settings)?)
    }

    fn notify_decision(&self, request: &PlanRequest) -> Result<()> {
        self.record(PlannerMail::decision(request, &self.settings))
    }

    fn notify_deleted(&self, request: &PlanRequest) -> Result<()> {
        self.record(PlannerMail::deleted(request, &self.settings))
    }
}

//! Presentation-layer collaborators: toasts and yes/no prompts.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient, dismissible user notification.
pub trait Notifier: Send + Sync {
    fn show(&self, message: &str, severity: Severity);
}

/// Blocking-for-the-workflow yes/no decision (e.g. "delete this event?").
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Routes notifications to the log.  Used by headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => tracing::info!(?severity, "{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        }
    }
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirmer for FixedAnswer {
    async fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, answer = self.0, "Auto-answered confirmation");
        self.0
    }
}

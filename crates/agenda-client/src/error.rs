use thiserror::Error;

use agenda_net::GatewayError;
use agenda_shared::ValidationError;
use agenda_store::StoreError;

use crate::notify::Severity;

/// Failure of a workflow operation.  The workflow state and the form are
/// left as they were before the operation started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Rejected by the re-entrancy guard: another submit/remove is in flight.
    #[error("Another operation is still in progress")]
    Busy,

    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

impl ManagerError {
    /// Text shown to the user.  Transport and parse failures share one
    /// message.
    pub fn user_message(&self) -> String {
        match self {
            ManagerError::Validation(e) => e.reason.clone(),
            ManagerError::Gateway(GatewayError::Http { message, .. }) => message.clone(),
            ManagerError::Gateway(GatewayError::Network(_) | GatewayError::Parse(_)) => {
                "Could not reach the server, please try again".to_string()
            }
            ManagerError::Gateway(GatewayError::MissingCsrfToken(_)) => {
                "Your session has expired, please reload the page".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ManagerError::Validation(_) | ManagerError::Busy => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

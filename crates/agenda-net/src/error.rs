use thiserror::Error;

/// Failures surfaced by [`crate::HttpGateway`].  No call is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport failure: connection refused, timeout, TLS, body read.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The body was expected to be JSON (or a given shape) and was not.
    #[error("Invalid server response: {0}")]
    Parse(String),

    /// A mutating call was attempted without the CSRF cookie.
    #[error("Missing CSRF cookie `{0}`")]
    MissingCsrfToken(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// 4xx: the request itself was rejected.
    pub fn is_client_error(&self) -> bool {
        matches!(self, GatewayError::Http { status, .. } if (400..500).contains(status))
    }

    /// 5xx: transient server-side failure.
    pub fn is_server_error(&self) -> bool {
        matches!(self, GatewayError::Http { status, .. } if *status >= 500)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Reverse geocoding failures.  Callers treat these as "no autofill".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Request(String),

    #[error("No address found for this position")]
    NoAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        let bad = GatewayError::Http {
            status: 422,
            message: "bad".into(),
        };
        let down = GatewayError::Http {
            status: 503,
            message: "down".into(),
        };
        assert!(bad.is_client_error() && !bad.is_server_error());
        assert!(down.is_server_error() && !down.is_client_error());
        assert!(!GatewayError::Network("x".into()).is_client_error());
        assert_eq!(down.status(), Some(503));
    }
}

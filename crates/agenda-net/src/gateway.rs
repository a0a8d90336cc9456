//! JSON-over-HTTP gateway.
//!
//! Every request carries the CSRF header when the session cookie is present;
//! mutating requests refuse to leave without it.  Bodies are JSON both ways.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error, warn};

use agenda_shared::constants::{
    CSRF_HEADER_NAME, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE,
};

use crate::csrf::cookie_value;
use crate::error::GatewayError;

/// Thin wrapper over a `reqwest::Client` bound to one origin.
///
/// Cloning is cheap: the client and its cookie jar are shared.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
    csrf_cookie: String,
}

impl HttpGateway {
    /// Build a gateway for `base_url`.  A path prefix on the base URL is kept
    /// when joining request paths.
    pub fn new(
        base_url: &str,
        csrf_cookie: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).map_err(|e| GatewayError::InvalidUrl(format!("{base}: {e}")))?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            jar,
            csrf_cookie: csrf_cookie.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Store a cookie for this origin (e.g. the session/CSRF pair obtained at
    /// login).
    pub fn set_cookie(&self, name: &str, value: &str) {
        self.jar
            .add_cookie_str(&format!("{name}={value}; Path=/"), &self.base_url);
    }

    /// Current CSRF secret, read from the cookie jar.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        cookie_value(header, &self.csrf_cookie)
    }

    /// Issue one request and decode the JSON reply.
    ///
    /// An empty success body yields `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        let url = self.url(path)?;
        let mutating = !matches!(method, Method::GET | Method::HEAD | Method::OPTIONS);

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json")
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE);

        match self.csrf_token() {
            Some(token) => request = request.header(CSRF_HEADER_NAME, token),
            None if mutating => {
                warn!(%method, %url, cookie = %self.csrf_cookie, "Refusing mutating request without CSRF cookie");
                return Err(GatewayError::MissingCsrfToken(self.csrf_cookie.clone()));
            }
            None => {}
        }

        if let Some(body) = body {
            // sets Content-Type: application/json
            request = request.json(body);
        }

        debug!(%method, %url, "HTTP request");

        let response = request.send().await.map_err(|e| {
            error!(%method, %url, error = %e, "HTTP transport failure");
            GatewayError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to read response body: {e}")))?;

        if !status.is_success() {
            let message = error_message(status, &text);
            if status.is_server_error() {
                error!(%method, %url, status = status.as_u16(), %message, "Server error");
            } else {
                warn!(%method, %url, status = status.as_u16(), %message, "Request rejected");
            }
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            error!(%method, %url, error = %e, "Response body is not JSON");
            GatewayError::Parse(e.to_string())
        })
    }

    fn url(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::InvalidUrl(format!("{path}: {e}")))
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url.as_str())
            .field("csrf_cookie", &self.csrf_cookie)
            .finish()
    }
}

/// Human-readable message for a rejected request.
///
/// Tries `detail`, then `message`, then the first field error of a
/// field-keyed validation body (in the server's key order), then falls back
/// to `"<status> <reason>"`.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = || {
        format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        )
    };

    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    for key in ["detail", "message"] {
        if let Some(Value::String(text)) = map.get(key) {
            if !text.trim().is_empty() {
                return text.trim().to_string();
            }
        }
    }

    for (field, value) in &map {
        let text = match value {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.iter().find_map(Value::as_str),
            _ => None,
        };
        if let Some(text) = text {
            return format!("{field}: {text}");
        }
    }

    fallback()
}

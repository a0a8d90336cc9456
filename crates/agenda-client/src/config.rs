//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration against a local development backend.

use std::time::Duration;

use agenda_net::{GatewayError, HttpGateway, NominatimGeocoder, RecordsApi};
use agenda_shared::constants::{
    CSRF_COOKIE_NAME, DEFAULT_LAT, DEFAULT_LNG, DEFAULT_ZOOM, GEOLOCATION_TIMEOUT_SECS,
    LOCATED_ZOOM, PARTICIPANTS_PATH, RECORDS_PATH,
};
use agenda_shared::Coordinates;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin (and optional path prefix) of the REST backend.
    /// Env: `AGENDA_BASE_URL`
    /// Default: `http://127.0.0.1:8000`
    pub base_url: String,

    /// Collection path of the records resource.
    /// Env: `AGENDA_RECORDS_PATH`
    /// Default: `/records/`
    pub records_path: String,

    /// Participants lookup path.
    /// Env: `AGENDA_PARTICIPANTS_PATH`
    /// Default: `/participants/`
    pub participants_path: String,

    /// Cookie the CSRF secret is read from.
    /// Env: `AGENDA_CSRF_COOKIE`
    /// Default: `csrftoken`
    pub csrf_cookie: String,

    /// Per-request timeout.
    /// Env: `AGENDA_REQUEST_TIMEOUT_SECS`
    /// Default: 15 s
    pub request_timeout: Duration,

    /// Cap on the device geolocation wait.
    /// Env: `AGENDA_GEO_TIMEOUT_SECS`
    /// Default: 10 s
    pub geolocation_timeout: Duration,

    /// Map centre used for a blank form.
    /// Env: `AGENDA_DEFAULT_LAT` / `AGENDA_DEFAULT_LNG`
    /// Default: Belém do Pará
    pub default_position: Coordinates,

    pub default_zoom: u8,
    pub located_zoom: u8,

    /// Interval of the background refresh.  Zero disables polling.
    /// Env: `AGENDA_POLL_INTERVAL_SECS`
    /// Default: 60 s
    pub poll_interval: Duration,

    /// Reverse geocoding endpoint (Nominatim `/reverse`).
    /// Env: `AGENDA_GEOCODER_URL`
    /// Default: unset (no location autofill).
    pub geocoder_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            records_path: RECORDS_PATH.to_string(),
            participants_path: PARTICIPANTS_PATH.to_string(),
            csrf_cookie: CSRF_COOKIE_NAME.to_string(),
            request_timeout: Duration::from_secs(15),
            geolocation_timeout: Duration::from_secs(GEOLOCATION_TIMEOUT_SECS),
            default_position: Coordinates::new(DEFAULT_LAT, DEFAULT_LNG),
            default_zoom: DEFAULT_ZOOM,
            located_zoom: LOCATED_ZOOM,
            poll_interval: Duration::from_secs(60),
            geocoder_url: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("AGENDA_BASE_URL") {
            config.base_url = url;
        }

        if let Some(path) = lookup("AGENDA_RECORDS_PATH") {
            config.records_path = path;
        }

        if let Some(path) = lookup("AGENDA_PARTICIPANTS_PATH") {
            config.participants_path = path;
        }

        if let Some(name) = lookup("AGENDA_CSRF_COOKIE") {
            if !name.is_empty() {
                config.csrf_cookie = name;
            }
        }

        if let Some(secs) = parse_secs(&lookup, "AGENDA_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = secs;
        }

        if let Some(secs) = parse_secs(&lookup, "AGENDA_GEO_TIMEOUT_SECS") {
            config.geolocation_timeout = secs;
        }

        if let Some(secs) = parse_secs(&lookup, "AGENDA_POLL_INTERVAL_SECS") {
            config.poll_interval = secs;
        }

        if let (Some(lat), Some(lng)) = (lookup("AGENDA_DEFAULT_LAT"), lookup("AGENDA_DEFAULT_LNG")) {
            match (lat.trim().parse::<f64>(), lng.trim().parse::<f64>()) {
                (Ok(lat), Ok(lng)) if Coordinates::new(lat, lng).is_valid() => {
                    config.default_position = Coordinates::new(lat, lng);
                }
                _ => {
                    tracing::warn!(%lat, %lng, "Invalid AGENDA_DEFAULT_LAT/LNG, using default");
                }
            }
        }

        if let Some(url) = lookup("AGENDA_GEOCODER_URL") {
            if !url.is_empty() {
                config.geocoder_url = Some(url);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }

    /// Build the REST client described by this configuration.
    pub fn records_api(&self) -> Result<RecordsApi, GatewayError> {
        let gateway = HttpGateway::new(&self.base_url, self.csrf_cookie.clone(), self.request_timeout)?;
        Ok(RecordsApi::new(
            gateway,
            self.records_path.clone(),
            self.participants_path.clone(),
        ))
    }

    /// Build the reverse geocoder, if one is configured.  A bad endpoint only
    /// disables autofill.
    pub fn geocoder(&self) -> Option<NominatimGeocoder> {
        let url = self.geocoder_url.as_deref()?;
        match NominatimGeocoder::new(url, self.request_timeout) {
            Ok(geocoder) => Some(geocoder),
            Err(e) => {
                tracing::warn!(error = %e, "Invalid AGENDA_GEOCODER_URL, location autofill disabled");
                None
            }
        }
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(n) => Some(Duration::from_secs(n)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid duration, using default");
            None
        }
    }
}

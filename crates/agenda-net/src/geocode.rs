//! Best-effort reverse geocoding (coordinates to a postal address).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use agenda_shared::Coordinates;

use crate::error::GeocodeError;

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, at: Coordinates) -> Result<String, GeocodeError>;
}

/// Nominatim-compatible `/reverse` endpoint client.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    endpoint: Url,
}

#[derive(Deserialize)]
struct ReverseReply {
    display_name: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let endpoint = Url::parse(endpoint).map_err(|e| GeocodeError::Request(e.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agenda-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeocodeError::Request(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, at: Coordinates) -> Result<String, GeocodeError> {
        let (lat, lng) = at.to_fixed();
        let reply: ReverseReply = self
            .client
            .get(self.endpoint.clone())
            .query(&[("format", "jsonv2"), ("lat", lat.as_str()), ("lon", lng.as_str())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GeocodeError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let address = reply
            .display_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(GeocodeError::NoAddress)?;

        debug!(lat = at.lat, lng = at.lng, %address, "Reverse geocoded");
        Ok(address)
    }
}

//! # agenda-net
//!
//! HTTP plumbing for the agenda client:
//! - [`HttpGateway`]: JSON request/response over `reqwest` with CSRF header
//!   injection from the session cookie jar
//! - [`RecordsApi`]: typed calls over the `/records/` collection resource and
//!   the participants lookup
//! - [`NominatimGeocoder`]: best-effort reverse geocoding

pub mod csrf;
pub mod gateway;
pub mod geocode;
pub mod records;

mod error;

pub use error::{GatewayError, GeocodeError};
pub use gateway::HttpGateway;
pub use geocode::{NominatimGeocoder, ReverseGeocoder};
pub use records::RecordsApi;

// Re-exported so callers can name methods without depending on reqwest.
pub use reqwest::Method;

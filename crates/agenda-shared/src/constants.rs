/// Default map centre latitude (Belém do Pará)
pub const DEFAULT_LAT: f64 = -1.4558;

/// Default map centre longitude (Belém do Pará)
pub const DEFAULT_LNG: f64 = -48.5039;

/// Zoom level used for the default map view
pub const DEFAULT_ZOOM: u8 = 13;

/// Zoom level used after locating the device or loading a record position
pub const LOCATED_ZOOM: u8 = 15;

/// Decimal digits kept for reported coordinates (~0.11 m)
pub const COORDINATE_DECIMALS: usize = 6;

/// Cookie holding the per-session CSRF secret
pub const CSRF_COOKIE_NAME: &str = "csrftoken";

/// Header carrying the CSRF secret on requests
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";

/// Header marking requests as issued by script, not by navigation
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// Maximum wait for a device position, in seconds
pub const GEOLOCATION_TIMEOUT_SECS: u64 = 10;

/// Default REST collection paths
pub const RECORDS_PATH: &str = "/records/";
pub const PARTICIPANTS_PATH: &str = "/participants/";

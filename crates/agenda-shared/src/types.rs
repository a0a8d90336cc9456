use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::COORDINATE_DECIMALS;
use crate::status::DisplayStatus;

// Server-assigned record identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Foreign identifier of a participant (speaker)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entry of the participants lookup (`GET /participants/`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

/// A WGS84 position picked on the map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Round both axes to [`COORDINATE_DECIMALS`] digits.
    pub fn rounded(self) -> Self {
        Self {
            lat: round_coordinate(self.lat),
            lng: round_coordinate(self.lng),
        }
    }

    /// Both axes finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Fixed-precision text form used by the coordinate inputs.
    pub fn to_fixed(&self) -> (String, String) {
        (
            format!("{:.*}", COORDINATE_DECIMALS, self.lat),
            format!("{:.*}", COORDINATE_DECIMALS, self.lng),
        )
    }
}

pub fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_DECIMALS as i32);
    (value * scale).round() / scale
}

/// A managed event.
///
/// `id` is `None` until the server has persisted the record.  The invariant
/// `end_at > start_at` is enforced when a record is built from form input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub participants: BTreeSet<ParticipantId>,
}

impl Record {
    /// Copy of this record with the identifier stripped (create payload).
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    /// Copy of this record carrying `id` (update payload).
    pub fn with_id(&self, id: RecordId) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> DisplayStatus {
        DisplayStatus::of(self.start_at, self.end_at, now)
    }
}

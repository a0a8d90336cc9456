//! Event form model and its binding to [`Record`].
//!
//! [`EventForm`] holds the raw input values exactly as a browser form would
//! (strings for text, date and time inputs).  [`FormBinder`] converts between
//! that and a validated record, splitting timestamps into local date and
//! time inputs.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use agenda_shared::{Coordinates, Field, Participant, ParticipantId, Record, RecordId, ValidationError};

/// Raw values of the bound inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventForm {
    /// Hidden id input; set while editing a persisted record.
    pub record_id: Option<RecordId>,
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `HH:MM`
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub location: String,
    /// Comma separated.
    pub tags: String,
    pub flagged: bool,
    pub latitude: String,
    pub longitude: String,
    /// Selected entries of the participants multi-select.
    pub participants: BTreeSet<ParticipantId>,
    /// Options of the participants multi-select; survives a reset.
    pub participant_options: Vec<Participant>,
}

impl EventForm {
    /// Blank every input, keeping the loaded participant options.
    pub fn reset(&mut self) {
        let options = std::mem::take(&mut self.participant_options);
        *self = Self {
            participant_options: options,
            ..Self::default()
        };
    }

    pub fn set_coordinates(&mut self, at: Option<Coordinates>) {
        let (lat, lng) = at.map(|c| c.to_fixed()).unwrap_or_default();
        self.latitude = lat;
        self.longitude = lng;
    }
}

/// Reads and writes [`EventForm`] values in a given time zone.
///
/// Browsers split timestamps in their local zone, hence the [`Local`]
/// default.
#[derive(Debug, Clone)]
pub struct FormBinder<Tz: TimeZone = Local> {
    tz: Tz,
}

impl FormBinder<Local> {
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl Default for FormBinder<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Tz: TimeZone> FormBinder<Tz> {
    pub fn with_timezone(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build a record from the form.
    ///
    /// Rules are checked in a fixed order and the first violation is
    /// returned: title, start, end, end after start, location, coordinates.
    pub fn read(&self, form: &EventForm) -> Result<Record, ValidationError> {
        let title = form.title.trim();
        if title.is_empty() {
            return Err(ValidationError::new(
                Field::Title,
                "Please fill in the event title",
            ));
        }

        let start_at = self.timestamp(&form.start_date, &form.start_time, Field::StartAt)?;
        let end_at = self.timestamp(&form.end_date, &form.end_time, Field::EndAt)?;
        if end_at <= start_at {
            return Err(ValidationError::new(
                Field::EndAt,
                "The end time must be after the start time",
            ));
        }

        let location = form.location.trim();
        if location.is_empty() {
            return Err(ValidationError::new(
                Field::Location,
                "Please fill in the event location",
            ));
        }

        let coordinates = read_coordinates(&form.latitude, &form.longitude)?;

        let description = Some(form.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let tags = form
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Record {
            id: form.record_id,
            title: title.to_string(),
            description,
            start_at,
            end_at,
            location: location.to_string(),
            coordinates,
            tags,
            flagged: form.flagged,
            participants: form.participants.clone(),
        })
    }

    /// Populate every bound input from `record`.  Participant options are
    /// left untouched.
    pub fn write(&self, form: &mut EventForm, record: &Record) {
        let (start_date, start_time) = self.split(record.start_at);
        let (end_date, end_time) = self.split(record.end_at);

        form.record_id = record.id;
        form.title = record.title.clone();
        form.description = record.description.clone().unwrap_or_default();
        form.start_date = start_date;
        form.start_time = start_time;
        form.end_date = end_date;
        form.end_time = end_time;
        form.location = record.location.clone();
        form.tags = record.tags.join(", ");
        form.flagged = record.flagged;
        form.set_coordinates(record.coordinates);
        form.participants = record.participants.clone();
    }

    fn split(&self, at: DateTime<Utc>) -> (String, String) {
        let local = at.with_timezone(&self.tz).naive_local();
        (
            format!("{:04}-{:02}-{:02}", local.year(), local.month(), local.day()),
            format!("{:02}:{:02}", local.hour(), local.minute()),
        )
    }

    fn timestamp(&self, date: &str, time: &str, field: Field) -> Result<DateTime<Utc>, ValidationError> {
        let which = if field == Field::StartAt { "start" } else { "end" };

        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
            ValidationError::new(field, format!("Please select the {which} date"))
        })?;
        let time = parse_time(time.trim()).ok_or_else(|| {
            ValidationError::new(field, format!("Please select the {which} time"))
        })?;

        self.tz
            .from_local_datetime(&NaiveDateTime::new(date, time))
            // a repeated hour at a DST fall-back resolves to its first
            // occurrence, so the second one does not survive write then read
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                ValidationError::new(
                    field,
                    format!("The {which} time does not exist in the local time zone"),
                )
            })
    }
}

// Time inputs may report seconds; precision is the minute.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let time = NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()?;
    time.with_second(0)
}

fn read_coordinates(lat: &str, lng: &str) -> Result<Option<Coordinates>, ValidationError> {
    let (lat, lng) = (lat.trim(), lng.trim());
    if lat.is_empty() && lng.is_empty() {
        return Ok(None);
    }
    if lat.is_empty() || lng.is_empty() {
        return Err(ValidationError::new(
            Field::Coordinates,
            "Both latitude and longitude are required",
        ));
    }

    let parsed = match (lat.parse::<f64>(), lng.parse::<f64>()) {
        (Ok(lat), Ok(lng)) => Coordinates::new(lat, lng),
        _ => {
            return Err(ValidationError::new(
                Field::Coordinates,
                "Latitude and longitude must be numbers",
            ))
        }
    };
    if !parsed.is_valid() {
        return Err(ValidationError::new(
            Field::Coordinates,
            "Coordinates are out of range",
        ));
    }
    Ok(Some(parsed.rounded()))
}

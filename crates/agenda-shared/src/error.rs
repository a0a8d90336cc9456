use std::fmt;

use thiserror::Error;

/// Form field a validation rule is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    StartAt,
    EndAt,
    Location,
    Coordinates,
}

impl Field {
    /// Wire / form name of the field.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::StartAt => "start_at",
            Field::EndAt => "end_at",
            Field::Location => "location",
            Field::Coordinates => "coordinates",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A client-side rule violated by form input.  Never reaches the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_reason_only() {
        let err = ValidationError::new(Field::EndAt, "End must be after start");
        assert_eq!(err.to_string(), "End must be after start");
        assert_eq!(err.field.to_string(), "end_at");
    }
}

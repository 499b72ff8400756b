use thiserror::Error;

#[derive(Error, Debug)]
pub enum HotelError {
    #[error("Invalid input: {reason}")]
    Validation { reason: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error(
        "Room {room_id} is not available for the selected dates (conflicts with reservation {reservation_id})"
    )]
    Conflict {
        room_id: String,
        reservation_id: String,
    },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Store error: {reason}")]
    Store { reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),
}

impl HotelError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// True for faults the caller fixes by changing the request
    /// (validation and illegal transitions), as opposed to conflicts,
    /// missing records or server-side failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidTransition { .. })
    }
}

pub type Result<T> = std::result::Result<T, HotelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display() {
        let err = HotelError::validation("check-out must be after check-in");
        let msg = err.to_string();
        assert!(msg.contains("Invalid input"));
        assert!(msg.contains("check-out must be after check-in"));
    }

    #[test]
    fn conflict_display_names_room_and_reservation() {
        let err = HotelError::Conflict {
            room_id: "room-101".into(),
            reservation_id: "rsv-7".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("room-101"));
        assert!(msg.contains("rsv-7"));
        assert!(msg.contains("not available"));
    }

    #[test]
    fn not_found_display() {
        let err = HotelError::not_found("Property", "p-42");
        assert_eq!(err.to_string(), "Property not found: p-42");
    }

    #[test]
    fn invalid_transition_display() {
        let err = HotelError::InvalidTransition {
            from: "CHECKED_OUT".into(),
            to: "CONFIRMED".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("CHECKED_OUT"));
        assert!(msg.contains("CONFIRMED"));
    }

    #[test]
    fn client_error_classification() {
        assert!(HotelError::validation("bad").is_client_error());
        assert!(
            HotelError::InvalidTransition {
                from: "A".into(),
                to: "B".into()
            }
            .is_client_error()
        );
        assert!(
            !HotelError::Conflict {
                room_id: "r".into(),
                reservation_id: "x".into()
            }
            .is_client_error()
        );
        assert!(!HotelError::not_found("Room", "r").is_client_error());
    }

    #[test]
    fn error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{invalid").unwrap_err();
        let err: HotelError = json_err.into();
        assert!(matches!(err, HotelError::Json(_)));
        assert!(err.to_string().contains("JSON error"));
    }
}

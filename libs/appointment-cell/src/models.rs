// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    /// Calendar date of the visit; the time of day lives in `time_slot`.
    pub date: NaiveDate,
    /// `"HH:MM"` start, or a legacy `"HH:MM-HH:MM"` range.
    pub time_slot: String,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Only live bookings hold a slot against availability.
    pub fn occupies_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub dentist_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentSearchQuery {
    pub dentist_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

// Error types specific to appointment operations
#[derive(Debug, Clone)]
pub enum AppointmentError {
    NotFound,
    DentistNotFound,
    SlotUnavailable(String),
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    NotAuthorized(String),
    ValidationError(String),
    Database(String),
}

impl fmt::Display for AppointmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentError::NotFound => write!(f, "Appointment not found"),
            AppointmentError::DentistNotFound => write!(f, "Dentist not found"),
            AppointmentError::SlotUnavailable(msg) => write!(f, "Slot unavailable: {}", msg),
            AppointmentError::InvalidTransition { from, to } => {
                write!(f, "Cannot change appointment status from {} to {}", from, to)
            }
            AppointmentError::NotAuthorized(msg) => write!(f, "Not authorized: {}", msg),
            AppointmentError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppointmentError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for AppointmentError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_live_statuses_occupy_slots() {
        assert!(AppointmentStatus::Pending.occupies_slot());
        assert!(AppointmentStatus::Confirmed.occupies_slot());
        assert!(!AppointmentStatus::Cancelled.occupies_slot());
        assert!(!AppointmentStatus::Completed.occupies_slot());
    }

    #[test]
    fn status_transitions() {
        use AppointmentStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: AppointmentStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, AppointmentStatus::Completed);
    }
}

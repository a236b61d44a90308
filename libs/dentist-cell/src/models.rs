use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::schedule::{SlotTime, WorkingHours};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dentist {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    /// Global flag a dentist can flip to stop taking bookings entirely,
    /// independent of the weekly schedule.
    pub is_available: bool,
    pub working_hours: WorkingHours,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of an appointment row the resolver needs to subtract booked
/// slots. The status filter happens in the store query.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedAppointment {
    pub time_slot: String,
    pub status: String,
}

/// Open hours for the requested weekday, echoed back alongside the slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenHours {
    pub start: SlotTime,
    pub end: SlotTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub time_slots: Vec<SlotTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<OpenHours>,
}

impl AvailabilityResponse {
    /// Normal negative result: valid configuration, nothing bookable.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            time_slots: Vec::new(),
            message: Some(message.into()),
            working_hours: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateScheduleRequest {
    pub working_hours: WorkingHours,
}

// Error types specific to dentist operations
#[derive(Debug, Clone)]
pub enum DentistError {
    NotFound,
    ValidationError(String),
    Database(String),
}

impl std::fmt::Display for DentistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DentistError::NotFound => write!(f, "Dentist not found"),
            DentistError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            DentistError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DentistError {}

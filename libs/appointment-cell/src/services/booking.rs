// libs/appointment-cell/src/services/booking.rs
use std::collections::HashSet;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use dentist_cell::models::DentistError;
use dentist_cell::services::AvailabilityService;
use shared_database::store::DocumentStore;
use shared_database::AppState;
use shared_models::auth::{Capability, Principal, Role};
use shared_models::schedule::SlotTime;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    BookAppointmentRequest, UpdateStatusRequest,
};

#[derive(Debug, Deserialize)]
struct DentistRef {
    id: Uuid,
}

pub struct BookingService {
    store: DocumentStore,
    availability_service: AvailabilityService,
}

impl BookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            availability_service: AvailabilityService::new(state),
        }
    }

    /// Book a slot for a patient. The slot is re-validated against the
    /// resolver's grid first; this is best-effort, and the store's own
    /// conflict handling decides a race between two concurrent bookings.
    pub async fn book_appointment(
        &self,
        patient_id: &str,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with dentist {} on {} at {}",
            patient_id, request.dentist_id, request.date, request.time_slot
        );

        let slot: SlotTime = request
            .time_slot
            .parse()
            .map_err(|_| {
                AppointmentError::ValidationError(format!(
                    "Invalid time slot '{}', expected zero-padded HH:MM",
                    request.time_slot
                ))
            })?;

        let availability = self
            .availability_service
            .get_availability(&request.dentist_id.to_string(), request.date)
            .await
            .map_err(|e| match e {
                DentistError::NotFound => AppointmentError::DentistNotFound,
                DentistError::ValidationError(msg) => AppointmentError::ValidationError(msg),
                DentistError::Database(msg) => AppointmentError::Database(msg),
            })?;

        if !availability.available {
            return Err(AppointmentError::SlotUnavailable(
                availability
                    .message
                    .unwrap_or_else(|| "Dentist is not available on this date".to_string()),
            ));
        }

        if !availability.time_slots.contains(&slot) {
            return Err(AppointmentError::SlotUnavailable(format!(
                "The {} slot is not bookable on {}",
                slot, request.date
            )));
        }

        let appointment_data = json!({
            "patient_id": patient_id,
            "dentist_id": request.dentist_id,
            "date": request.date,
            "time_slot": slot.to_string(),
            "status": AppointmentStatus::Pending,
            "reason": request.reason,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Appointment> = self
            .store
            .insert_returning("/rest/v1/appointments", Some(auth_token), appointment_data)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                // A uniqueness rejection from the store means another booking won the race
                if msg.starts_with("Conflict") {
                    AppointmentError::SlotUnavailable("Slot was booked by another patient".to_string())
                } else {
                    AppointmentError::Database(msg)
                }
            })?;

        let appointment = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("Failed to create appointment".to_string()))?;

        info!("Appointment {} created as pending", appointment.id);
        Ok(appointment)
    }

    /// Appointments visible to the caller: patients see their own, dentists
    /// their own schedule, admins anything the query asks for.
    pub async fn list_appointments(
        &self,
        principal: &Principal,
        query: AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = String::from("/rest/v1/appointments?order=date.asc,time_slot.asc");

        match principal.role {
            Role::Patient => path.push_str(&format!("&patient_id=eq.{}", principal.id)),
            Role::Dentist => path.push_str(&format!("&dentist_id=eq.{}", principal.id)),
            Role::Admin => {
                if let Some(patient_id) = query.patient_id {
                    path.push_str(&format!("&patient_id=eq.{}", patient_id));
                }
                if let Some(dentist_id) = query.dentist_id {
                    path.push_str(&format!("&dentist_id=eq.{}", dentist_id));
                }
            }
        }

        if let Some(date) = query.date {
            path.push_str(&format!("&date=eq.{}", date));
        }
        if let Some(status) = query.status {
            path.push_str(&format!("&status=eq.{}", status));
        }

        let appointments: Vec<Appointment> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        self.filter_orphans(appointments, auth_token).await
    }

    /// "Safe find": the store permits dangling dentist references, so rows
    /// pointing at a deleted dentist are dropped from listings rather than
    /// surfaced as errors.
    async fn filter_orphans(
        &self,
        appointments: Vec<Appointment>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if appointments.is_empty() {
            return Ok(appointments);
        }

        let dentist_ids: HashSet<Uuid> = appointments.iter().map(|a| a.dentist_id).collect();
        let id_list = dentist_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let path = format!("/rest/v1/dentists?id=in.({})&select=id", id_list);
        let known: Vec<DentistRef> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let known_ids: HashSet<Uuid> = known.into_iter().map(|d| d.id).collect();

        let filtered = appointments
            .into_iter()
            .filter(|appointment| {
                let known = known_ids.contains(&appointment.dentist_id);
                if !known {
                    warn!(
                        "Dropping orphaned appointment {} referencing missing dentist {}",
                        appointment.id, appointment.dentist_id
                    );
                }
                known
            })
            .collect();

        Ok(filtered)
    }

    /// Status transitions. Dentists and admins manage the lifecycle; a
    /// patient may only cancel their own pending appointment.
    pub async fn update_status(
        &self,
        principal: &Principal,
        appointment_id: &str,
        request: UpdateStatusRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.fetch_appointment(appointment_id, auth_token).await?;
        let next = request.status;

        if principal.role.can(Capability::ManageAppointments) {
            if principal.role == Role::Dentist
                && appointment.dentist_id.to_string() != principal.id
            {
                return Err(AppointmentError::NotAuthorized(
                    "Dentists may only manage their own appointments".to_string(),
                ));
            }
        } else {
            if appointment.patient_id.to_string() != principal.id {
                return Err(AppointmentError::NotAuthorized(
                    "Patients may only cancel their own appointments".to_string(),
                ));
            }
            if next != AppointmentStatus::Cancelled {
                return Err(AppointmentError::NotAuthorized(
                    "Patients may only cancel appointments".to_string(),
                ));
            }
        }

        if !appointment.status.can_transition_to(next) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: next,
            });
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let update_data = json!({
            "status": next,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let updated: Vec<Appointment> = self
            .store
            .update_returning(&path, Some(auth_token), update_data)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let appointment = updated.into_iter().next().ok_or(AppointmentError::NotFound)?;
        debug!("Appointment {} is now {}", appointment.id, appointment.status);

        Ok(appointment)
    }

    async fn fetch_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Appointment> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        result.into_iter().next().ok_or(AppointmentError::NotFound)
    }
}

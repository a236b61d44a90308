use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use reqwest::Method;
use tracing::debug;

use shared_database::store::DocumentStore;
use shared_database::AppState;
use shared_models::schedule::SlotTime;

use crate::models::{AvailabilityResponse, BookedAppointment, Dentist, DentistError, OpenHours};

/// Stateless, request-scoped availability read: two sequential store queries,
/// no caching, no reservation semantics. A returned slot can be booked by a
/// concurrent request moments later; the store's own conflict handling at
/// appointment creation is what decides races.
pub struct AvailabilityService {
    store: DocumentStore,
    slot_interval_minutes: u16,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            slot_interval_minutes: state.config.slot_interval_minutes,
        }
    }

    /// Bookable slots for a dentist on a calendar date.
    ///
    /// Closed days and globally unavailable dentists produce a normal
    /// `available=false` response, not an error. Past dates are not rejected
    /// here; stale-date policy belongs to the caller.
    pub async fn get_availability(
        &self,
        dentist_id: &str,
        date: NaiveDate,
    ) -> Result<AvailabilityResponse, DentistError> {
        debug!("Resolving availability for dentist {} on {}", dentist_id, date);

        let dentist = self.fetch_dentist(dentist_id).await?;

        if !dentist.is_available {
            debug!("Dentist {} is globally unavailable", dentist_id);
            return Ok(AvailabilityResponse::unavailable(
                "Dentist is not currently accepting appointments",
            ));
        }

        let Some((start, end)) = dentist.working_hours.for_weekday(date.weekday()).open_hours()
        else {
            debug!("Dentist {} is closed on {}", dentist_id, date.weekday());
            return Ok(AvailabilityResponse::unavailable(
                "Dentist is closed on this day",
            ));
        };

        let booked = self.fetch_booked_slots(dentist_id, date).await?;

        let time_slots: Vec<SlotTime> = slot_grid(start, end, self.slot_interval_minutes)
            .into_iter()
            .filter(|slot| !booked.contains(slot.to_string().as_str()))
            .collect();

        debug!(
            "Dentist {} has {} bookable slots on {}",
            dentist_id,
            time_slots.len(),
            date
        );

        Ok(AvailabilityResponse {
            available: true,
            time_slots,
            message: None,
            working_hours: Some(OpenHours { start, end }),
        })
    }

    pub(crate) async fn fetch_dentist(&self, dentist_id: &str) -> Result<Dentist, DentistError> {
        let path = format!("/rest/v1/dentists?id=eq.{}", dentist_id);
        let result: Vec<Dentist> = self
            .store
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| DentistError::Database(e.to_string()))?;

        result.into_iter().next().ok_or(DentistError::NotFound)
    }

    /// Start times of the dentist's slot-occupying appointments on `date`.
    /// Only `pending` and `confirmed` rows occupy a slot.
    async fn fetch_booked_slots(
        &self,
        dentist_id: &str,
        date: NaiveDate,
    ) -> Result<HashSet<String>, DentistError> {
        let path = format!(
            "/rest/v1/appointments?dentist_id=eq.{}&date=eq.{}&status=in.(pending,confirmed)&select=time_slot,status",
            dentist_id, date
        );

        let appointments: Vec<BookedAppointment> = self
            .store
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| DentistError::Database(e.to_string()))?;

        Ok(appointments
            .iter()
            .map(|appointment| normalize_booked_slot(&appointment.time_slot).to_string())
            .collect())
    }
}

/// Candidate grid: every interval step from `start`, strictly before `end`.
/// Generation order is chronological, so no post-sort or dedup is needed.
pub fn slot_grid(start: SlotTime, end: SlotTime, interval_minutes: u16) -> Vec<SlotTime> {
    if interval_minutes == 0 {
        return Vec::new();
    }

    let mut slots = Vec::new();
    let mut current = start;
    while current < end {
        slots.push(current);
        match current.step(interval_minutes) {
            Some(next) => current = next,
            None => break,
        }
    }
    slots
}

/// A stored slot is either `"HH:MM"` or a legacy `"HH:MM-HH:MM"` range; only
/// the start matters for grid subtraction. Values that do not line up with
/// the grid simply match nothing.
pub fn normalize_booked_slot(raw: &str) -> &str {
    raw.split_once('-').map_or(raw, |(start, _)| start).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(s: &str) -> SlotTime {
        s.parse().unwrap()
    }

    #[test]
    fn grid_steps_by_interval_and_stops_before_end() {
        let slots = slot_grid(slot("09:00"), slot("10:00"), 30);
        assert_eq!(slots, vec![slot("09:00"), slot("09:30")]);
    }

    #[test]
    fn grid_excludes_slot_equal_to_end() {
        let slots = slot_grid(slot("09:00"), slot("09:30"), 30);
        assert_eq!(slots, vec![slot("09:00")]);
    }

    #[test]
    fn grid_is_empty_when_start_equals_end() {
        assert!(slot_grid(slot("09:00"), slot("09:00"), 30).is_empty());
    }

    #[test]
    fn grid_is_strictly_increasing() {
        let slots = slot_grid(slot("08:00"), slot("18:00"), 30);
        for pair in slots.windows(2) {
            assert_eq!(
                pair[1].minute_of_day(),
                pair[0].minute_of_day() + 30,
                "slots must increase by exactly the interval"
            );
        }
    }

    #[test]
    fn grid_handles_uneven_window() {
        // 45 minutes of opening with a 30-minute interval: the second slot
        // would start inside the window, end past it is not this fn's concern
        let slots = slot_grid(slot("09:00"), slot("09:45"), 30);
        assert_eq!(slots, vec![slot("09:00"), slot("09:30")]);
    }

    #[test]
    fn grid_survives_late_night_windows() {
        let slots = slot_grid(slot("23:00"), slot("23:59"), 30);
        assert_eq!(slots, vec![slot("23:00"), slot("23:30")]);
    }

    #[test]
    fn zero_interval_yields_no_slots() {
        assert!(slot_grid(slot("09:00"), slot("17:00"), 0).is_empty());
    }

    #[test]
    fn normalize_strips_range_suffix() {
        assert_eq!(normalize_booked_slot("10:00-10:30"), "10:00");
        assert_eq!(normalize_booked_slot("10:00"), "10:00");
        assert_eq!(normalize_booked_slot(" 10:00 "), "10:00");
    }
}

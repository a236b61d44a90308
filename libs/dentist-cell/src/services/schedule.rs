use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use shared_database::store::DocumentStore;
use shared_database::AppState;
use shared_models::schedule::WorkingHours;

use crate::models::{Dentist, DentistError};

/// Validates and persists a dentist's weekly schedule. Validation happens
/// before any write, so a rejected update leaves the stored configuration
/// untouched; the write itself is a single document update.
pub struct ScheduleService {
    store: DocumentStore,
}

impl ScheduleService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn get_schedule(
        &self,
        dentist_id: &str,
        auth_token: &str,
    ) -> Result<WorkingHours, DentistError> {
        debug!("Fetching schedule for dentist {}", dentist_id);

        let path = format!("/rest/v1/dentists?id=eq.{}", dentist_id);
        let result: Vec<Dentist> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| DentistError::Database(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(|dentist| dentist.working_hours)
            .ok_or(DentistError::NotFound)
    }

    pub async fn update_schedule(
        &self,
        dentist_id: &str,
        working_hours: WorkingHours,
        auth_token: &str,
    ) -> Result<WorkingHours, DentistError> {
        debug!("Updating schedule for dentist {}", dentist_id);

        working_hours
            .validate()
            .map_err(|e| DentistError::ValidationError(e.to_string()))?;

        let path = format!("/rest/v1/dentists?id=eq.{}", dentist_id);
        let update_data = json!({
            "working_hours": working_hours,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let updated: Vec<Dentist> = self
            .store
            .update_returning(&path, Some(auth_token), update_data)
            .await
            .map_err(|e| DentistError::Database(e.to_string()))?;

        let dentist = updated.into_iter().next().ok_or(DentistError::NotFound)?;
        debug!("Schedule updated for dentist {}", dentist.id);

        Ok(dentist.working_hours)
    }
}

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::Principal;
use shared_models::error::AppError;

use crate::models::{DentistError, UpdateScheduleRequest};
use crate::services::{AvailabilityService, ScheduleService};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

fn map_dentist_error(e: DentistError) -> AppError {
    match e {
        DentistError::NotFound => AppError::NotFound("Dentist not found".to_string()),
        DentistError::ValidationError(msg) => AppError::ValidationError(msg),
        DentistError::Database(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(dentist_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    // Reject malformed dates before touching the store
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", query.date)))?;

    let availability_service = AvailabilityService::new(&state);

    let availability = availability_service
        .get_availability(&dentist_id, date)
        .await
        .map_err(map_dentist_error)?;

    Ok(Json(json!({
        "dentist_id": dentist_id,
        "date": date,
        "available": availability.available,
        "time_slots": availability.time_slots,
        "message": availability.message,
        "working_hours": availability.working_hours,
    })))
}

// ==============================================================================
// SCHEDULE HANDLERS (DENTIST SELF-SERVICE)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(dentist_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    principal.ensure_self(&dentist_id, "view the schedule")?;

    let schedule_service = ScheduleService::new(&state);

    let working_hours = schedule_service
        .get_schedule(&dentist_id, auth.token())
        .await
        .map_err(map_dentist_error)?;

    Ok(Json(json!({ "working_hours": working_hours })))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(dentist_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    // Only the dentist themselves may rewrite their schedule
    principal.ensure_self(&dentist_id, "update the schedule")?;

    let schedule_service = ScheduleService::new(&state);

    let working_hours = schedule_service
        .update_schedule(&dentist_id, request.working_hours, auth.token())
        .await
        .map_err(map_dentist_error)?;

    Ok(Json(json!({ "working_hours": working_hours })))
}

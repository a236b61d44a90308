use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::Principal;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentSearchQuery, BookAppointmentRequest, UpdateStatusRequest,
};
use crate::services::BookingService;

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::DentistNotFound => AppError::NotFound("Dentist not found".to_string()),
        AppointmentError::SlotUnavailable(msg) => AppError::Conflict(msg),
        AppointmentError::InvalidTransition { .. } => AppError::ValidationError(e.to_string()),
        AppointmentError::NotAuthorized(msg) => AppError::Forbidden(msg),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .book_appointment(&principal.id, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .list_appointments(&principal, query, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .update_status(&principal, &appointment_id, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

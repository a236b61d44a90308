use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_database::AppState;
use shared_models::auth::Capability;
use shared_utils::extractor::{auth_middleware, require_capability};

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    let booking_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .layer(middleware::from_fn(require_capability(Capability::BookAppointment)));

    // Listing and status changes are open to every role; ownership and
    // transition rules live in the booking service.
    let viewing_routes = Router::new()
        .route("/", get(handlers::list_appointments))
        .route("/{appointment_id}/status", patch(handlers::update_status))
        .layer(middleware::from_fn(require_capability(Capability::ViewAppointments)));

    Router::new()
        .merge(booking_routes)
        .merge(viewing_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

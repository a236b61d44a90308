use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use dentist_cell::router::dentist_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Dental clinic API is running!" }))
        .nest("/dentists", dentist_routes(state.clone()))
        .nest("/appointments", appointment_routes(state))
}

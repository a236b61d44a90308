use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use shared_database::AppState;
use shared_models::auth::Capability;
use shared_utils::extractor::{auth_middleware, require_capability};

use crate::handlers;

pub fn dentist_routes(state: Arc<AppState>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/{dentist_id}/availability", get(handlers::get_availability));

    // Schedule management, scoped to the dentist capability
    let schedule_routes = Router::new()
        .route("/{dentist_id}/schedule", get(handlers::get_schedule))
        .route("/{dentist_id}/schedule", patch(handlers::update_schedule))
        .layer(middleware::from_fn(require_capability(Capability::ManageSchedule)))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(schedule_routes)
        .with_state(state)
}

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_database::AppState;
use shared_models::auth::{Capability, Principal};
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Authentication middleware: validates the bearer token once and injects a
/// typed [`Principal`] into the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    let principal =
        validate_token(token, &state.config.supabase_jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Layer factory for capability scoping. Placed after [`auth_middleware`] on a
/// route group, it rejects callers whose role does not grant `capability`
/// before any handler runs.
pub fn require_capability(
    capability: Capability,
) -> impl Fn(Request<Body>, Next) -> Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>
       + Clone
       + Send {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let principal = request
                .extensions()
                .get::<Principal>()
                .cloned()
                .ok_or_else(|| AppError::Auth("Missing authenticated principal".to_string()))?;

            if !principal.role.can(capability) {
                return Err(AppError::Forbidden(format!(
                    "Role '{}' is not permitted to perform this action",
                    principal.role
                )));
            }

            Ok(next.run(request).await)
        })
    }
}

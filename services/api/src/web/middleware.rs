//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use course_core::ports::PortError;
use std::sync::Arc;
use tracing::{debug, error};

use crate::adapters::identity::session_from_cookie_header;
use crate::error::ErrorReply;
use crate::web::state::AppState;

/// Middleware that validates the auth session cookie and extracts the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized. Session store failures are a 500.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ErrorReply> {
    // 1. Extract the session id from the cookie header
    let auth_session_id = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_from_cookie_header)
        .ok_or_else(|| ErrorReply::unauthorized("Authorization denied. No token."))?;

    // 2. Resolve it to the owning user
    let user_id = state
        .identity
        .resolve(auth_session_id)
        .await
        .map_err(identity_failure)?;

    // 3. Insert user_id into request extensions
    req.extensions_mut().insert(user_id);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

/// Rejected credentials are a 401; a failing session store is a 500.
pub(crate) fn identity_failure(e: PortError) -> ErrorReply {
    match e {
        PortError::Unauthorized | PortError::NotFound(_) => {
            debug!("Rejected auth session: {}", e);
            ErrorReply::unauthorized("Token is not valid.")
        }
        other => {
            error!("Failed to resolve auth session: {}", other);
            ErrorReply::internal("Failed to check the session.")
        }
    }
}

//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout and session checks.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use course_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::identity::session_from_cookie_header;
use crate::error::{ErrorBody, ErrorReply};
use crate::web::{middleware::identity_failure, rest::parse_body, state::AppState};

const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_cookie(auth_session_id: &str, ttl: Duration) -> String {
    format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        ttl.num_seconds()
    )
}

/// Creates an auth session for `user_id` and returns the `Set-Cookie` value.
async fn start_session(state: &AppState, user_id: Uuid) -> Result<String, ErrorReply> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::try_days(state.config.session_ttl_days)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or_else(|| {
            error!("Invalid session lifetime: {} days", state.config.session_ttl_days);
            ErrorReply::internal("Failed to create session")
        })?;
    let expires_at = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| ErrorReply::internal("Failed to create session"))?;

    state
        .db
        .create_auth_session(&auth_session_id, user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            ErrorReply::internal("Failed to create session")
        })?;

    Ok(session_cookie(&auth_session_id, ttl))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid input or email taken", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ErrorReply> {
    let req = parse_body(payload)?;
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.len() < MIN_PASSWORD_LEN {
        return Err(ErrorReply::bad_request(
            "Please provide an email and a password of at least 6 characters.",
        ));
    }

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ErrorReply::internal("Failed to hash password")
        })?
        .to_string();

    // 2. Create user in database
    let user = state
        .db
        .create_user_with_email(&email, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::AlreadyExists(_) => {
                ErrorReply::bad_request("An account with this email already exists.")
            }
            other => {
                error!("Failed to create user: {:?}", other);
                ErrorReply::internal("Failed to create user")
            }
        })?;

    // 3. Log the new user in
    let cookie = start_session(&state, user.user_id).await?;
    info!("New user {} signed up", user.user_id);

    let response = AuthResponse {
        user_id: user.user_id,
        email: user.email,
    };
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ErrorReply> {
    let req = parse_body(payload)?;
    let invalid = || ErrorReply::unauthorized("Invalid credentials");

    // 1. Get user by email
    let user_creds = state
        .db
        .get_user_by_email(&normalize_email(&req.email))
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => invalid(),
            other => {
                error!("Failed to get user: {:?}", other);
                ErrorReply::internal("Authentication error")
            }
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ErrorReply::internal("Authentication error")
    })?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    // 3. Start the session
    let cookie = start_session(&state, user_creds.user_id).await?;

    let response = AuthResponse {
        user_id: user_creds.user_id,
        email: user_creds.email,
    };
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ErrorReply> {
    let auth_session_id = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_from_cookie_header);

    if let Some(auth_session_id) = auth_session_id {
        state
            .db
            .delete_auth_session(auth_session_id)
            .await
            .map_err(|e| {
                error!("Failed to delete auth session: {:?}", e);
                ErrorReply::internal("Failed to logout")
            })?;
    }

    // Clear cookie
    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}

/// GET /auth/verify - Report whether the request carries a valid session
#[utoipa::path(
    get,
    path = "/auth/verify",
    responses(
        (status = 200, description = "Session status", body = VerifyResponse),
        (status = 500, description = "Session store unavailable", body = ErrorBody)
    )
)]
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, ErrorReply> {
    let auth_session_id = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_from_cookie_header);

    let user_id = match auth_session_id {
        Some(id) => match state.identity.resolve(id).await {
            Ok(user_id) => Some(user_id),
            Err(e) => match identity_failure(e) {
                reply if reply.status == StatusCode::UNAUTHORIZED => None,
                reply => return Err(reply),
            },
        },
        None => None,
    };

    Ok(Json(VerifyResponse {
        logged_in: user_id.is_some(),
        user_id,
    }))
}

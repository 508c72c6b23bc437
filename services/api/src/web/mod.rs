pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod study;

use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

pub use middleware::require_auth;
use state::AppState;

/// Builds the API router: public auth routes plus session-protected course
/// and study routes, wrapped in the configured CORS policy.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/verify", get(auth::verify_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/courses",
            post(rest::create_course_handler).get(rest::list_courses_handler),
        )
        .route(
            "/courses/{course_id}",
            get(rest::get_course_handler).delete(rest::delete_course_handler),
        )
        .route(
            "/courses/{course_id}/modules",
            post(rest::materialize_module_handler),
        )
        .route(
            "/courses/{course_id}/modules/videos",
            post(rest::attach_videos_handler),
        )
        .route("/deep-dive", post(study::deep_dive_handler))
        .route("/quiz", post(study::quiz_handler))
        .route("/search", post(study::search_handler))
        .route("/videos", post(study::videos_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors_layer(&app_state.config.allowed_origins))
        .with_state(app_state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}

//! services/api/src/web/state.rs
//!
//! Defines the shared application state passed to every handler.

use crate::config::Config;
use course_core::ports::{DatabaseService, IdentityProvider};
use course_core::GenerationOrchestrator;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityProvider>,
    pub orchestrator: Arc<GenerationOrchestrator>,
}

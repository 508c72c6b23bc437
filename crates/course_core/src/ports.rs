//! crates/course_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Course, ModuleSlot, OwnerId, User, UserCredentials, VideoRef};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user of an unexpired auth session.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Course Management ---
    /// Persists a brand new course, roadmap and slots together.
    async fn create_course(&self, course: &Course) -> PortResult<()>;

    /// Looks a course up by id *and* owner. A course owned by someone else is
    /// reported as `NotFound`, exactly like a missing one.
    async fn find_course_owned(&self, owner_id: OwnerId, course_id: Uuid) -> PortResult<Course>;

    /// All courses of an owner, newest first.
    async fn list_courses_owned(&self, owner_id: OwnerId) -> PortResult<Vec<Course>>;

    async fn delete_course_owned(&self, owner_id: OwnerId, course_id: Uuid) -> PortResult<()>;

    /// Atomically applies `Course::upsert_slot` to the stored course and persists it.
    /// Slots with other titles are never touched, whatever else is written concurrently.
    async fn upsert_course_slot(
        &self,
        owner_id: OwnerId,
        course_id: Uuid,
        slot: &ModuleSlot,
    ) -> PortResult<()>;
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Sends a prompt to the model, asking for a JSON response, and returns the raw text.
    async fn complete(&self, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait VideoSearchService: Send + Sync {
    /// Searches for videos, most relevant first.
    async fn search(&self, query: &str, limit: usize) -> PortResult<Vec<VideoRef>>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an opaque credential (e.g. a session cookie value) to its subject.
    async fn resolve(&self, credential: &str) -> PortResult<OwnerId>;
}

//! crates/course_core/src/memory.rs
//!
//! An in-process implementation of `DatabaseService`. Used by tests and by the
//! server when no database URL is configured; nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{AuthSession, Course, ModuleSlot, OwnerId, User, UserCredentials};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, UserCredentials>,
    auth_sessions: HashMap<String, AuthSession>,
    // Insertion order, oldest first.
    courses: Vec<Course>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn course_not_found(course_id: Uuid) -> PortError {
    PortError::NotFound(format!("Course {} not found", course_id))
}

#[async_trait]
impl DatabaseService for InMemoryStore {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut state = self.state.write().await;
        if state.users.contains_key(email) {
            return Err(PortError::AlreadyExists(format!("User {}", email)));
        }
        let credentials = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        let user = User {
            user_id: credentials.user_id,
            email: credentials.email.clone(),
        };
        state.users.insert(email.to_string(), credentials);
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.state
            .read()
            .await
            .users
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let session = AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        };
        self.state
            .write()
            .await
            .auth_sessions
            .insert(session_id.to_string(), session);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let state = self.state.read().await;
        match state.auth_sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.state.write().await.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn create_course(&self, course: &Course) -> PortResult<()> {
        let mut state = self.state.write().await;
        if state.courses.iter().any(|c| c.id == course.id) {
            return Err(PortError::AlreadyExists(format!("Course {}", course.id)));
        }
        state.courses.push(course.clone());
        Ok(())
    }

    async fn find_course_owned(&self, owner_id: OwnerId, course_id: Uuid) -> PortResult<Course> {
        self.state
            .read()
            .await
            .courses
            .iter()
            .find(|c| c.id == course_id && c.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| course_not_found(course_id))
    }

    async fn list_courses_owned(&self, owner_id: OwnerId) -> PortResult<Vec<Course>> {
        let state = self.state.read().await;
        // Newest insertion first, so equal timestamps still list newest first.
        let mut courses: Vec<Course> = state
            .courses
            .iter()
            .rev()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses)
    }

    async fn delete_course_owned(&self, owner_id: OwnerId, course_id: Uuid) -> PortResult<()> {
        let mut state = self.state.write().await;
        let before = state.courses.len();
        state
            .courses
            .retain(|c| !(c.id == course_id && c.owner_id == owner_id));
        if state.courses.len() == before {
            return Err(course_not_found(course_id));
        }
        Ok(())
    }

    async fn upsert_course_slot(
        &self,
        owner_id: OwnerId,
        course_id: Uuid,
        slot: &ModuleSlot,
    ) -> PortResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .courses
            .iter_mut()
            .find(|c| c.id == course_id && c.owner_id == owner_id)
            .ok_or_else(|| course_not_found(course_id))?;
        stored.upsert_slot(slot.clone());
        Ok(())
    }
}

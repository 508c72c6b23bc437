//! services/api/src/adapters/identity.rs
//!
//! The cookie-session identity provider: a session id issued at login resolves
//! to its user while the stored auth session is unexpired.

use std::sync::Arc;

use async_trait::async_trait;
use course_core::domain::OwnerId;
use course_core::ports::{DatabaseService, IdentityProvider, PortResult};

#[derive(Clone)]
pub struct SessionIdentityProvider {
    db: Arc<dyn DatabaseService>,
}

impl SessionIdentityProvider {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentityProvider {
    async fn resolve(&self, credential: &str) -> PortResult<OwnerId> {
        self.db.validate_auth_session(credential).await
    }
}

/// Extracts the `session` value from a `Cookie` header.
pub fn session_from_cookie_header(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

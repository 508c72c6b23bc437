//! crates/course_core/src/domain.rs
//!
//! Defines the core data structures for the application: the `Course` aggregate,
//! its roadmap and module slots, and the account records used by the identity gate.
//!
//! Course types serialize with camelCase field names; that shape is both the
//! JSON document stored for a course and the body returned to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The authenticated subject that owns a course.
pub type OwnerId = Uuid;

/// One topic in a course roadmap. Immutable once the roadmap is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoadmapEntry {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// A reference to a supporting video found by the video search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    pub video_id: String,
    pub title: String,
}

/// The generation state and content of a single roadmap entry.
///
/// `title` is the identity key of the slot inside its course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSlot {
    pub title: String,
    #[serde(default)]
    pub is_generated: bool,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub deep_dive_topics: Vec<String>,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
    #[serde(default)]
    pub youtube_videos: Vec<VideoRef>,
}

impl ModuleSlot {
    /// A freshly created slot: nothing generated yet.
    pub fn ungenerated(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            is_generated: false,
            notes: Vec::new(),
            deep_dive_topics: Vec::new(),
            flashcards: Vec::new(),
            youtube_videos: Vec::new(),
        }
    }
}

/// The aggregate root: a roadmap plus one module slot per roadmap entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub original_prompt: String,
    pub roadmap: Vec<RoadmapEntry>,
    pub lessons: Vec<ModuleSlot>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Builds a new course with one ungenerated slot per roadmap entry.
    pub fn from_roadmap(
        owner_id: OwnerId,
        title: String,
        original_prompt: String,
        roadmap: Vec<RoadmapEntry>,
    ) -> Self {
        let lessons = roadmap
            .iter()
            .map(|entry| ModuleSlot::ungenerated(entry.title.clone()))
            .collect();

        Self {
            id: Uuid::new_v4(),
            owner_id,
            title,
            original_prompt,
            roadmap,
            lessons,
            created_at: Utc::now(),
        }
    }

    pub fn slot(&self, title: &str) -> Option<&ModuleSlot> {
        self.lessons.iter().find(|slot| slot.title == title)
    }

    pub fn roadmap_entry(&self, title: &str) -> Option<&RoadmapEntry> {
        self.roadmap.iter().find(|entry| entry.title == title)
    }

    /// Replaces the slot with the same title, or appends it when no slot matches.
    ///
    /// Applying the same slot twice leaves `lessons` unchanged.
    pub fn upsert_slot(&mut self, slot: ModuleSlot) {
        match self.lessons.iter_mut().find(|s| s.title == slot.title) {
            Some(existing) => *existing = slot,
            None => self.lessons.push(slot),
        }
    }

    pub fn summary(&self) -> CourseSummary {
        CourseSummary {
            id: self.id,
            title: self.title.clone(),
            original_prompt: self.original_prompt.clone(),
            module_count: self.lessons.len(),
            generated_count: self.lessons.iter().filter(|s| s.is_generated).count(),
            created_at: self.created_at,
        }
    }
}

/// The listing view of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub original_prompt: String,
    pub module_count: usize,
    pub generated_count: usize,
    pub created_at: DateTime<Utc>,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

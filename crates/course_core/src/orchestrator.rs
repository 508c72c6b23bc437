//! crates/course_core/src/orchestrator.rs
//!
//! The Generation Orchestrator: creates courses from a topic, materializes module
//! slots on first access, and runs the stateless study helpers (deep dive, quiz,
//! Q&A, video lookup).
//!
//! Module slots move `Ungenerated -> Generated` exactly once. Every read-generate-write
//! cycle for a slot runs while holding the lock for `(owner, course, module title)`,
//! so overlapping requests for the same module produce a single generation call.
//! Writes go through the store's slot-level upsert, so modules of the same course
//! generated side by side never overwrite each other.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{Course, CourseSummary, ModuleSlot, OwnerId, RoadmapEntry, VideoRef};
use crate::generation::{
    ContentGenerator, DeepDivePayload, GenerationError, QuizPayload, SearchAnswerPayload,
};
use crate::locks::KeyedLocks;
use crate::ports::{DatabaseService, PortError};
use crate::videos::VideoFinder;

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum CourseError {
    /// Missing or invalid request input; user-correctable.
    #[error("{0}")]
    Validation(String),

    /// The course does not exist or belongs to someone else.
    #[error("Course not found or access denied.")]
    NotFound,

    #[error(transparent)]
    GenerationFailed(#[from] GenerationError),

    #[error("Storage error: {0}")]
    Storage(PortError),
}

impl From<PortError> for CourseError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::NotFound(_) => CourseError::NotFound,
            other => CourseError::Storage(other),
        }
    }
}

pub type CourseResult<T> = Result<T, CourseError>;

//=========================================================================================
// Policy
//=========================================================================================

/// Cost-bounding limits applied by the orchestrator.
#[derive(Debug, Clone)]
pub struct GenerationPolicy {
    pub quiz_max_questions: u32,
    pub default_video_results: usize,
    pub max_video_results: usize,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            quiz_max_questions: 10,
            default_video_results: 2,
            max_video_results: 10,
        }
    }
}

//=========================================================================================
// The Orchestrator
//=========================================================================================

type ModuleKey = (OwnerId, Uuid, String);

pub struct GenerationOrchestrator {
    db: Arc<dyn DatabaseService>,
    generator: ContentGenerator,
    videos: VideoFinder,
    module_locks: KeyedLocks<ModuleKey>,
    policy: GenerationPolicy,
}

/// Trimmed, non-empty input or a validation error carrying `message`.
fn required<'a>(value: &'a str, message: &str) -> CourseResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CourseError::Validation(message.to_string()));
    }
    Ok(trimmed)
}

/// Drops entries without a title and repeated titles, keeping the first.
fn unique_entries(entries: Vec<RoadmapEntry>) -> Vec<RoadmapEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .map(|e| RoadmapEntry {
            title: e.title.trim().to_string(),
            description: e.description.trim().to_string(),
        })
        .filter(|e| {
            let keep = !e.title.is_empty() && seen.insert(e.title.clone());
            if !keep {
                warn!("Dropping roadmap entry '{}' (empty or duplicate title)", e.title);
            }
            keep
        })
        .collect()
}

impl GenerationOrchestrator {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        generator: ContentGenerator,
        videos: VideoFinder,
        policy: GenerationPolicy,
    ) -> Self {
        Self {
            db,
            generator,
            videos,
            module_locks: KeyedLocks::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &GenerationPolicy {
        &self.policy
    }

    // --- Course Aggregate ---

    /// Generates a roadmap for `topic` and persists a new course with one
    /// ungenerated slot per entry. Nothing is stored if generation fails.
    pub async fn create_course(&self, owner_id: OwnerId, topic: &str) -> CourseResult<Course> {
        let topic = required(topic, "A topic is required.")?;

        let payload = self.generator.roadmap(topic).await?;
        let roadmap = unique_entries(payload.roadmap);
        let title = payload
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| topic.to_string());

        let course = Course::from_roadmap(owner_id, title, topic.to_string(), roadmap);
        self.db.create_course(&course).await?;

        info!(
            "Created course {} '{}' with {} modules for user {}",
            course.id,
            course.title,
            course.lessons.len(),
            owner_id
        );
        Ok(course)
    }

    pub async fn get_course(&self, owner_id: OwnerId, course_id: Uuid) -> CourseResult<Course> {
        Ok(self.db.find_course_owned(owner_id, course_id).await?)
    }

    pub async fn list_courses(&self, owner_id: OwnerId) -> CourseResult<Vec<CourseSummary>> {
        let courses = self.db.list_courses_owned(owner_id).await?;
        Ok(courses.iter().map(Course::summary).collect())
    }

    pub async fn delete_course(&self, owner_id: OwnerId, course_id: Uuid) -> CourseResult<()> {
        self.db.delete_course_owned(owner_id, course_id).await?;
        info!("Deleted course {} for user {}", course_id, owner_id);
        Ok(())
    }

    // --- Module State Machine ---

    /// Returns the generated slot for `module_title`, generating it first if needed.
    ///
    /// A slot that is already generated is returned as stored, without calling the
    /// generator or writing anything. On generation failure the course is left
    /// untouched and the call can be retried.
    pub async fn materialize_module(
        &self,
        owner_id: OwnerId,
        course_id: Uuid,
        module_title: &str,
        module_description: &str,
    ) -> CourseResult<ModuleSlot> {
        let title = required(module_title, "A module title is required.")?;
        let _guard = self
            .module_locks
            .lock((owner_id, course_id, title.to_string()))
            .await;

        let course = self.db.find_course_owned(owner_id, course_id).await?;

        let existing = course.slot(title).cloned();
        if let Some(slot) = &existing {
            if slot.is_generated {
                debug!("Module '{}' of course {} already generated", title, course_id);
                return Ok(slot.clone());
            }
        } else if course.roadmap_entry(title).is_none() {
            return Err(CourseError::NotFound);
        }

        let description = match module_description.trim() {
            "" => course
                .roadmap_entry(title)
                .map(|e| e.description.clone())
                .unwrap_or_default(),
            given => given.to_string(),
        };

        let payload = self.generator.module_detail(title, &description).await?;
        if let Some(generated_title) = payload.title.as_deref() {
            if generated_title != title {
                debug!(
                    "Generator retitled '{}' as '{}'; keeping the roadmap title",
                    title, generated_title
                );
            }
        }

        let slot = ModuleSlot {
            title: title.to_string(),
            is_generated: true,
            notes: payload.detailed_notes.into_paragraphs(),
            deep_dive_topics: payload.deep_dive_topics.unwrap_or_default(),
            flashcards: payload.flashcards.unwrap_or_default(),
            youtube_videos: existing.map(|s| s.youtube_videos).unwrap_or_default(),
        };

        self.db
            .upsert_course_slot(owner_id, course_id, &slot)
            .await?;

        info!("Generated module '{}' of course {}", title, course_id);
        Ok(slot)
    }

    /// Looks up videos for a module and stores them on its slot, replacing any
    /// previous list. When the lookup yields nothing the slot is returned as is.
    pub async fn attach_videos(
        &self,
        owner_id: OwnerId,
        course_id: Uuid,
        module_title: &str,
    ) -> CourseResult<ModuleSlot> {
        let title = required(module_title, "A module title is required.")?;
        let _guard = self
            .module_locks
            .lock((owner_id, course_id, title.to_string()))
            .await;

        let course = self.db.find_course_owned(owner_id, course_id).await?;
        let mut slot = course.slot(title).cloned().ok_or(CourseError::NotFound)?;

        let query = format!("{} {}", course.title, title);
        let videos = self
            .videos
            .find_videos(&query, self.policy.default_video_results)
            .await;
        if videos.is_empty() || videos == slot.youtube_videos {
            return Ok(slot);
        }

        slot.youtube_videos = videos;
        self.db
            .upsert_course_slot(owner_id, course_id, &slot)
            .await?;
        Ok(slot)
    }

    // --- Stateless Study Helpers ---

    pub async fn deep_dive(
        &self,
        original_text: &str,
        sub_topic: &str,
    ) -> CourseResult<DeepDivePayload> {
        let sub_topic = required(sub_topic, "A sub-topic is required.")?;
        Ok(self.generator.deep_dive(original_text.trim(), sub_topic).await?)
    }

    /// Generates a quiz. `question_count` must be positive and is capped by policy.
    pub async fn generate_quiz(
        &self,
        lesson_topic: &str,
        question_count: i64,
    ) -> CourseResult<QuizPayload> {
        const MISSING: &str = "Lesson topic and question count are required.";
        let lesson_topic = required(lesson_topic, MISSING)?;
        if question_count < 1 {
            return Err(CourseError::Validation(MISSING.to_string()));
        }

        let cap = self.policy.quiz_max_questions.max(1);
        let count = u32::try_from(question_count).unwrap_or(u32::MAX).min(cap);
        if i64::from(count) < question_count {
            debug!("Capping quiz from {} to {} questions", question_count, count);
        }

        Ok(self.generator.quiz(lesson_topic, count).await?)
    }

    pub async fn answer_question(
        &self,
        context_notes: &str,
        user_question: &str,
    ) -> CourseResult<SearchAnswerPayload> {
        const MISSING: &str = "Context and question are required.";
        let context_notes = required(context_notes, MISSING)?;
        let user_question = required(user_question, MISSING)?;
        Ok(self
            .generator
            .search_answer(context_notes, user_question)
            .await?)
    }

    /// Best-effort video search; never fails once the query is valid.
    pub async fn fetch_videos(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> CourseResult<Vec<VideoRef>> {
        let query = required(query, "A search query is required.")?;
        let limit = max_results
            .unwrap_or(self.policy.default_video_results)
            .clamp(1, self.policy.max_video_results.max(1));
        Ok(self.videos.find_videos(query, limit).await)
    }
}

//! crates/course_core/src/generation.rs
//!
//! The Content Generator: turns a generation request into a prompt, calls the
//! text generation port under a timeout, and parses the reply into a typed,
//! validated payload.
//!
//! Parsing happens in two steps. The reply (stripped of markdown fences) must be
//! a JSON object, otherwise the result is `Malformed`. The fields each payload
//! kind needs must be present and non-null, otherwise the result is `Incomplete`.
//! Only then is the object deserialized into its payload type.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::domain::{Flashcard, RoadmapEntry};
use crate::ports::TextGenerationService;
use crate::prompts;

//=========================================================================================
// Kinds and Errors
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Roadmap,
    ModuleDetail,
    DeepDive,
    Quiz,
    SearchAnswer,
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationKind::Roadmap => "roadmap",
            GenerationKind::ModuleDetail => "module detail",
            GenerationKind::DeepDive => "deep dive",
            GenerationKind::Quiz => "quiz",
            GenerationKind::SearchAnswer => "search answer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The model replied with something that is not the expected JSON.
    #[error("Malformed {kind} generation: {reason}")]
    Malformed { kind: GenerationKind, reason: String },

    /// The JSON parsed but a required field is missing or empty.
    #[error("Incomplete {kind} generation: missing `{field}`")]
    Incomplete {
        kind: GenerationKind,
        field: &'static str,
    },

    /// The text generation call itself failed.
    #[error("Text generation failed: {0}")]
    Upstream(String),

    #[error("Text generation timed out after {0:?}")]
    TimedOut(Duration),
}

//=========================================================================================
// Requests
//=========================================================================================

/// A generation request with its kind-specific parameters.
#[derive(Debug, Clone)]
pub enum GenerationRequest<'a> {
    Roadmap {
        topic: &'a str,
    },
    ModuleDetail {
        title: &'a str,
        description: &'a str,
    },
    DeepDive {
        original_text: &'a str,
        sub_topic: &'a str,
    },
    Quiz {
        lesson_topic: &'a str,
        question_count: u32,
    },
    SearchAnswer {
        context_notes: &'a str,
        user_question: &'a str,
    },
}

impl GenerationRequest<'_> {
    pub fn kind(&self) -> GenerationKind {
        match self {
            GenerationRequest::Roadmap { .. } => GenerationKind::Roadmap,
            GenerationRequest::ModuleDetail { .. } => GenerationKind::ModuleDetail,
            GenerationRequest::DeepDive { .. } => GenerationKind::DeepDive,
            GenerationRequest::Quiz { .. } => GenerationKind::Quiz,
            GenerationRequest::SearchAnswer { .. } => GenerationKind::SearchAnswer,
        }
    }

    pub fn prompt(&self) -> String {
        match *self {
            GenerationRequest::Roadmap { topic } => prompts::roadmap(topic),
            GenerationRequest::ModuleDetail { title, description } => {
                prompts::module_detail(title, description)
            }
            GenerationRequest::DeepDive {
                original_text,
                sub_topic,
            } => prompts::deep_dive(original_text, sub_topic),
            GenerationRequest::Quiz {
                lesson_topic,
                question_count,
            } => prompts::quiz(lesson_topic, question_count),
            GenerationRequest::SearchAnswer {
                context_notes,
                user_question,
            } => prompts::search_answer(context_notes, user_question),
        }
    }
}

//=========================================================================================
// Payloads
//=========================================================================================

/// A structured payload the generator can produce.
pub trait Payload: DeserializeOwned {
    const KIND: GenerationKind;

    /// Fields that must be present and non-null in the raw JSON object.
    const REQUIRED: &'static [&'static str];

    /// Checks run after deserialization.
    fn validate(&self) -> Result<(), GenerationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoadmapPayload {
    #[serde(default)]
    pub title: Option<String>,
    pub roadmap: Vec<RoadmapEntry>,
}

impl Payload for RoadmapPayload {
    const KIND: GenerationKind = GenerationKind::Roadmap;
    const REQUIRED: &'static [&'static str] = &["roadmap"];

    fn validate(&self) -> Result<(), GenerationError> {
        if self.roadmap.iter().all(|e| e.title.trim().is_empty()) {
            return Err(GenerationError::Incomplete {
                kind: Self::KIND,
                field: "roadmap",
            });
        }
        Ok(())
    }
}

/// `detailedNotes` arrives either as a list of paragraphs or as one block of text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NotesField {
    Paragraphs(Vec<String>),
    Text(String),
}

impl NotesField {
    /// Non-empty, trimmed paragraphs. A single text block is split on blank lines.
    pub fn into_paragraphs(self) -> Vec<String> {
        let raw = match self {
            NotesField::Paragraphs(paragraphs) => paragraphs,
            NotesField::Text(text) => text.split("\n\n").map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetailPayload {
    #[serde(default)]
    pub title: Option<String>,
    pub detailed_notes: NotesField,
    #[serde(default)]
    pub deep_dive_topics: Option<Vec<String>>,
    #[serde(default)]
    pub flashcards: Option<Vec<Flashcard>>,
}

impl Payload for ModuleDetailPayload {
    const KIND: GenerationKind = GenerationKind::ModuleDetail;
    const REQUIRED: &'static [&'static str] = &["detailedNotes"];

    fn validate(&self) -> Result<(), GenerationError> {
        if self.detailed_notes.clone().into_paragraphs().is_empty() {
            return Err(GenerationError::Incomplete {
                kind: Self::KIND,
                field: "detailedNotes",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeepDivePayload {
    pub deeper_explanation: String,
}

impl Payload for DeepDivePayload {
    const KIND: GenerationKind = GenerationKind::DeepDive;
    const REQUIRED: &'static [&'static str] = &["deeperExplanation"];
}

/// A generated quiz. The question objects are passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizPayload {
    pub questions: Vec<Value>,
}

impl Payload for QuizPayload {
    const KIND: GenerationKind = GenerationKind::Quiz;
    const REQUIRED: &'static [&'static str] = &["questions"];
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchAnswerPayload {
    pub answer: String,
}

impl Payload for SearchAnswerPayload {
    const KIND: GenerationKind = GenerationKind::SearchAnswer;
    const REQUIRED: &'static [&'static str] = &["answer"];
}

//=========================================================================================
// Parsing
//=========================================================================================

/// Removes markdown code fences (```` ```json ```` / ```` ``` ````) around a reply.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim().trim_start_matches('\u{feff}');
    if let Some(rest) = s.strip_prefix("```") {
        // Drop the info string ("json") up to the end of the first line.
        s = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches("json"),
        };
        if let Some(body) = s.trim_end().strip_suffix("```") {
            s = body;
        }
    }
    s.trim()
}

/// Parses and validates a raw model reply as payload `P`.
pub fn parse_payload<P: Payload>(raw: &str) -> Result<P, GenerationError> {
    let malformed = |reason: String| GenerationError::Malformed {
        kind: P::KIND,
        reason,
    };

    let value: Value = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| malformed(format!("invalid JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| malformed("expected a JSON object".to_string()))?;

    for &field in P::REQUIRED {
        if object.get(field).map_or(true, Value::is_null) {
            return Err(GenerationError::Incomplete {
                kind: P::KIND,
                field,
            });
        }
    }

    let payload: P =
        serde_json::from_value(value).map_err(|e| malformed(format!("unexpected shape: {e}")))?;
    payload.validate()?;
    Ok(payload)
}

//=========================================================================================
// The Generator
//=========================================================================================

/// Wraps a text generation capability. Stateless, cheap to clone.
#[derive(Clone)]
pub struct ContentGenerator {
    text: Arc<dyn TextGenerationService>,
    timeout: Duration,
}

impl ContentGenerator {
    pub fn new(text: Arc<dyn TextGenerationService>, timeout: Duration) -> Self {
        Self { text, timeout }
    }

    /// Runs one generation. Never retried; any failure is surfaced to the caller.
    pub async fn generate<P: Payload>(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<P, GenerationError> {
        debug_assert_eq!(request.kind(), P::KIND);
        let kind = request.kind();
        let prompt = request.prompt();

        let raw = match tokio::time::timeout(self.timeout, self.text.complete(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                error!("{} generation call failed: {}", kind, e);
                return Err(GenerationError::Upstream(e.to_string()));
            }
            Err(_) => {
                error!("{} generation timed out after {:?}", kind, self.timeout);
                return Err(GenerationError::TimedOut(self.timeout));
            }
        };

        debug!("{} generation returned {} bytes", kind, raw.len());
        parse_payload::<P>(&raw).inspect_err(|e| error!("Rejected {} reply: {}", kind, e))
    }

    pub async fn roadmap(&self, topic: &str) -> Result<RoadmapPayload, GenerationError> {
        self.generate(GenerationRequest::Roadmap { topic }).await
    }

    pub async fn module_detail(
        &self,
        title: &str,
        description: &str,
    ) -> Result<ModuleDetailPayload, GenerationError> {
        self.generate(GenerationRequest::ModuleDetail { title, description })
            .await
    }

    pub async fn deep_dive(
        &self,
        original_text: &str,
        sub_topic: &str,
    ) -> Result<DeepDivePayload, GenerationError> {
        self.generate(GenerationRequest::DeepDive {
            original_text,
            sub_topic,
        })
        .await
    }

    pub async fn quiz(
        &self,
        lesson_topic: &str,
        question_count: u32,
    ) -> Result<QuizPayload, GenerationError> {
        self.generate(GenerationRequest::Quiz {
            lesson_topic,
            question_count,
        })
        .await
    }

    pub async fn search_answer(
        &self,
        context_notes: &str,
        user_question: &str,
    ) -> Result<SearchAnswerPayload, GenerationError> {
        self.generate(GenerationRequest::SearchAnswer {
            context_notes,
            user_question,
        })
        .await
    }
}

//! services/api/src/web/study.rs
//!
//! Stateless study helpers: deep dives, quizzes, contextual answers and video
//! lookups. None of these touch stored courses.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use course_core::domain::VideoRef;
use course_core::generation::{DeepDivePayload, QuizPayload, SearchAnswerPayload};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ErrorBody, ErrorReply};
use crate::web::{rest::parse_body, state::AppState};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeepDiveRequest {
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub sub_topic: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    #[serde(default)]
    pub lesson_topic: String,
    #[serde(default)]
    pub question_count: i64,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub context_notes: String,
    #[serde(default)]
    pub user_question: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideosRequest {
    #[serde(default)]
    pub query: String,
    pub max_results: Option<usize>,
}

/// Explain a sub-topic of some lesson text in more depth.
#[utoipa::path(
    post,
    path = "/deep-dive",
    request_body = DeepDiveRequest,
    responses(
        (status = 200, description = "The explanation", body = DeepDivePayload),
        (status = 400, description = "Missing sub-topic", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    )
)]
pub async fn deep_dive_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<DeepDiveRequest>, JsonRejection>,
) -> Result<Json<DeepDivePayload>, ErrorReply> {
    let req = parse_body(payload)?;
    let explanation = app_state
        .orchestrator
        .deep_dive(&req.original_text, &req.sub_topic)
        .await?;
    Ok(Json(explanation))
}

/// Generate a multiple-choice quiz on a lesson topic.
#[utoipa::path(
    post,
    path = "/quiz",
    request_body = QuizRequest,
    responses(
        (status = 200, description = "The quiz", body = QuizPayload),
        (status = 400, description = "Missing topic or question count", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    )
)]
pub async fn quiz_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> Result<Json<QuizPayload>, ErrorReply> {
    let req = parse_body(payload)?;
    let quiz = app_state
        .orchestrator
        .generate_quiz(&req.lesson_topic, req.question_count)
        .await?;
    Ok(Json(quiz))
}

/// Answer a question using the given notes as context.
#[utoipa::path(
    post,
    path = "/search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "The answer", body = SearchAnswerPayload),
        (status = 400, description = "Missing context or question", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    )
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchAnswerPayload>, ErrorReply> {
    let req = parse_body(payload)?;
    let answer = app_state
        .orchestrator
        .answer_question(&req.context_notes, &req.user_question)
        .await?;
    Ok(Json(answer))
}

/// Search for videos. Provider failures yield an empty list.
#[utoipa::path(
    post,
    path = "/videos",
    request_body = VideosRequest,
    responses(
        (status = 200, description = "Matching videos, possibly none", body = [VideoRef]),
        (status = 400, description = "Missing query", body = ErrorBody)
    )
)]
pub async fn videos_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<VideosRequest>, JsonRejection>,
) -> Result<Json<Vec<VideoRef>>, ErrorReply> {
    let req = parse_body(payload)?;
    let videos = app_state
        .orchestrator
        .fetch_videos(&req.query, req.max_results)
        .await?;
    Ok(Json(videos))
}

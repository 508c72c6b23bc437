//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the course endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ErrorBody, ErrorReply};
use crate::web::{auth, state::AppState, study};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use course_core::domain::{
    Course, CourseSummary, Flashcard, ModuleSlot, RoadmapEntry, VideoRef,
};
use course_core::generation::{DeepDivePayload, QuizPayload, SearchAnswerPayload};
use course_core::CourseError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::verify_handler,
        create_course_handler,
        list_courses_handler,
        get_course_handler,
        delete_course_handler,
        materialize_module_handler,
        attach_videos_handler,
        study::deep_dive_handler,
        study::quiz_handler,
        study::search_handler,
        study::videos_handler,
    ),
    components(
        schemas(
            Course, CourseSummary, ModuleSlot, RoadmapEntry, Flashcard, VideoRef,
            CreateCourseRequest, MaterializeModuleRequest, AttachVideosRequest,
            DeleteCourseResponse, ErrorBody,
            auth::CredentialsRequest, auth::AuthResponse, auth::VerifyResponse,
            study::DeepDiveRequest, study::QuizRequest, study::SearchRequest,
            study::VideosRequest, DeepDivePayload, QuizPayload, SearchAnswerPayload,
        )
    ),
    tags(
        (
            name = "Course Generator API",
            description = "Generate courses from a topic and study their modules."
        )
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub topic: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterializeModuleRequest {
    #[serde(default)]
    pub module_title: String,
    #[serde(default)]
    pub module_description: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachVideosRequest {
    #[serde(default)]
    pub module_title: String,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteCourseResponse {
    message: String,
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

/// Unwraps a JSON body, turning extractor rejections into a 400 `{error}` reply.
pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ErrorReply> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ErrorReply::bad_request(rejection.body_text()))
}

/// Course ids that do not parse are reported like any other unknown course.
fn parse_course_id(raw: &str) -> Result<Uuid, ErrorReply> {
    Uuid::parse_str(raw).map_err(|_| ErrorReply::from(CourseError::NotFound))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a course by generating a roadmap for a topic.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Missing topic", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 500, description = "Roadmap generation failed", body = ErrorBody)
    )
)]
pub async fn create_course_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ErrorReply> {
    let req = parse_body(payload)?;
    let course = app_state
        .orchestrator
        .create_course(user_id, &req.topic)
        .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// List the caller's courses, newest first.
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "Course summaries", body = [CourseSummary]),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn list_courses_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<CourseSummary>>, ErrorReply> {
    Ok(Json(app_state.orchestrator.list_courses(user_id).await?))
}

/// Fetch one of the caller's courses.
#[utoipa::path(
    get,
    path = "/courses/{course_id}",
    params(("course_id" = Uuid, Path, description = "The course id")),
    responses(
        (status = 200, description = "The course", body = Course),
        (status = 404, description = "Not found or not owned", body = ErrorBody)
    )
)]
pub async fn get_course_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<String>,
) -> Result<Json<Course>, ErrorReply> {
    let course_id = parse_course_id(&course_id)?;
    Ok(Json(
        app_state.orchestrator.get_course(user_id, course_id).await?,
    ))
}

/// Delete one of the caller's courses.
#[utoipa::path(
    delete,
    path = "/courses/{course_id}",
    params(("course_id" = Uuid, Path, description = "The course id")),
    responses(
        (status = 200, description = "Course deleted", body = DeleteCourseResponse),
        (status = 404, description = "Not found or not owned", body = ErrorBody)
    )
)]
pub async fn delete_course_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<String>,
) -> Result<Json<DeleteCourseResponse>, ErrorReply> {
    let course_id = parse_course_id(&course_id)?;
    app_state
        .orchestrator
        .delete_course(user_id, course_id)
        .await?;
    Ok(Json(DeleteCourseResponse {
        message: "Course deleted successfully.".to_string(),
    }))
}

/// Return a module's content, generating it on first access.
#[utoipa::path(
    post,
    path = "/courses/{course_id}/modules",
    params(("course_id" = Uuid, Path, description = "The course id")),
    request_body = MaterializeModuleRequest,
    responses(
        (status = 200, description = "The generated module", body = ModuleSlot),
        (status = 400, description = "Missing module title", body = ErrorBody),
        (status = 404, description = "Course or module not found", body = ErrorBody),
        (status = 500, description = "Module generation failed", body = ErrorBody)
    )
)]
pub async fn materialize_module_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<String>,
    payload: Result<Json<MaterializeModuleRequest>, JsonRejection>,
) -> Result<Json<ModuleSlot>, ErrorReply> {
    let course_id = parse_course_id(&course_id)?;
    let req = parse_body(payload)?;
    let slot = app_state
        .orchestrator
        .materialize_module(user_id, course_id, &req.module_title, &req.module_description)
        .await?;
    Ok(Json(slot))
}

/// Find supporting videos for a module and store them on it.
#[utoipa::path(
    post,
    path = "/courses/{course_id}/modules/videos",
    params(("course_id" = Uuid, Path, description = "The course id")),
    request_body = AttachVideosRequest,
    responses(
        (status = 200, description = "The module with its videos", body = ModuleSlot),
        (status = 400, description = "Missing module title", body = ErrorBody),
        (status = 404, description = "Course or module not found", body = ErrorBody)
    )
)]
pub async fn attach_videos_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<String>,
    payload: Result<Json<AttachVideosRequest>, JsonRejection>,
) -> Result<Json<ModuleSlot>, ErrorReply> {
    let course_id = parse_course_id(&course_id)?;
    let req = parse_body(payload)?;
    let slot = app_state
        .orchestrator
        .attach_videos(user_id, course_id, &req.module_title)
        .await?;
    Ok(Json(slot))
}

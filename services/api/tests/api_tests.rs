//! Router-level tests for the course API, run against the in-memory store and
//! scripted generation and video services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::SessionIdentityProvider;
use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use course_core::domain::VideoRef;
use course_core::ports::{
    IdentityProvider, PortError, PortResult, TextGenerationService, VideoSearchService,
};
use course_core::{ContentGenerator, GenerationOrchestrator, InMemoryStore, VideoFinder};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const ROADMAP: &str = r#"```json
{"title":"Data Science Foundations","roadmap":[
    {"title":"Statistics","description":"Descriptive statistics"},
    {"title":"Pandas","description":"Working with data frames"}]}
```"#;

//=========================================================================================
// Fakes
//=========================================================================================

/// Answers each prompt kind with canned JSON and counts module generations.
#[derive(Default)]
struct ScriptedText {
    failing: bool,
    module_calls: AtomicUsize,
}

#[async_trait]
impl TextGenerationService for ScriptedText {
    async fn complete(&self, prompt: &str) -> PortResult<String> {
        if self.failing {
            return Err(PortError::Unexpected("upstream said no: key sk-secret".into()));
        }
        let reply = if prompt.contains("curriculum designer") {
            ROADMAP.to_string()
        } else if prompt.contains("writing study material") {
            self.module_calls.fetch_add(1, Ordering::SeqCst);
            r#"{"title":"Ignored","detailedNotes":"First paragraph.\n\nSecond paragraph."}"#
                .to_string()
        } else if prompt.contains("expert examiner") {
            r#"{"questions":[{"question":"2+2?","options":["3","4"],"correctAnswer":"4"}]}"#
                .to_string()
        } else if prompt.contains("helpful tutor") {
            r#"{"answer":"Because of the central limit theorem."}"#.to_string()
        } else {
            r#"{"deeperExplanation":"More detail."}"#.to_string()
        };
        Ok(reply)
    }
}

struct FixedVideos {
    failing: bool,
}

#[async_trait]
impl VideoSearchService for FixedVideos {
    async fn search(&self, query: &str, limit: usize) -> PortResult<Vec<VideoRef>> {
        if self.failing {
            return Err(PortError::Unexpected("quota exceeded".into()));
        }
        Ok((0..limit)
            .map(|i| VideoRef {
                video_id: format!("vid{}", i),
                title: format!("{} #{}", query, i),
            })
            .collect())
    }
}

//=========================================================================================
// Harness
//=========================================================================================

struct TestApp {
    router: Router,
    text: Arc<ScriptedText>,
}

/// Session lookups fail as if the session store were unreachable.
struct UnreachableSessions;

#[async_trait]
impl IdentityProvider for UnreachableSessions {
    async fn resolve(&self, _credential: &str) -> PortResult<Uuid> {
        Err(PortError::Unexpected("connection refused".into()))
    }
}

fn build_app(
    text: ScriptedText,
    videos_failing: bool,
    config: Config,
    identity: Option<Arc<dyn IdentityProvider>>,
) -> TestApp {
    let db = Arc::new(InMemoryStore::new());
    let text = Arc::new(text);
    let config = Arc::new(config);
    let timeout = Duration::from_secs(5);

    let orchestrator = Arc::new(GenerationOrchestrator::new(
        db.clone(),
        ContentGenerator::new(text.clone(), timeout),
        VideoFinder::new(Arc::new(FixedVideos { failing: videos_failing }), timeout),
        config.generation_policy(),
    ));
    let identity = identity.unwrap_or_else(|| -> Arc<dyn IdentityProvider> {
        Arc::new(SessionIdentityProvider::new(db.clone()))
    });
    let app_state = Arc::new(AppState {
        db,
        config,
        identity,
        orchestrator,
    });

    TestApp {
        router: build_router(app_state),
        text,
    }
}

fn test_app(text: ScriptedText, videos_failing: bool) -> TestApp {
    build_app(text, videos_failing, Config::default(), None)
}

fn app() -> TestApp {
    test_app(ScriptedText::default(), false)
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Signs up a fresh account and returns its `session=...` cookie.
    async fn sign_up(&self, email: &str) -> String {
        let request = Request::builder()
            .method("POST")
            .uri("/auth/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"email": email, "password": "hunter22"}).to_string(),
            ))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn create_course(&self, cookie: &str) -> Value {
        let (status, course) = self
            .send("POST", "/courses", Some(cookie), Some(json!({"topic": "Data Science"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        course
    }
}

//=========================================================================================
// Identity
//=========================================================================================

#[tokio::test]
async fn course_routes_require_a_session() {
    let app = app();

    let (status, body) = app.send("GET", "/courses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app
        .send("GET", "/courses", Some("session=forged"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_validates_and_rejects_duplicates() {
    let app = app();

    let (status, _) = app
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({"email": "a@example.com", "password": "short"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.sign_up("a@example.com").await;
    let (status, body) = app
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({"email": " A@Example.com ", "password": "another1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn login_verify_and_logout() {
    let app = app();
    app.sign_up("b@example.com").await;

    let (status, _) = app
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "b@example.com", "password": "wrong-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "b@example.com", "password": "hunter22"}).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let (status, body) = app.send("GET", "/auth/verify", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loggedIn"], true);
    assert!(body["userId"].is_string());

    let (status, _) = app.send("POST", "/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", "/auth/verify", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loggedIn"], false);
    let (status, _) = app.send("GET", "/courses", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_store_outage_is_500_not_401() {
    let app = build_app(
        ScriptedText::default(),
        false,
        Config::default(),
        Some(Arc::new(UnreachableSessions)),
    );

    let (status, body) = app
        .send("GET", "/courses", Some("session=abc"), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"].as_str().unwrap().contains("connection refused"));

    let (status, _) = app
        .send("GET", "/auth/verify", Some("session=abc"), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = app.send("GET", "/auth/verify", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loggedIn"], false);
}

#[tokio::test]
async fn out_of_range_session_lifetime_fails_signup_cleanly() {
    let config = Config {
        session_ttl_days: i64::MAX / 1000,
        ..Config::default()
    };
    let app = build_app(ScriptedText::default(), false, config, None);

    let (status, body) = app
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({"email": "ttl@example.com", "password": "hunter22"})),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

//=========================================================================================
// Courses
//=========================================================================================

#[tokio::test]
async fn create_course_builds_one_slot_per_roadmap_entry() {
    let app = app();
    let cookie = app.sign_up("c@example.com").await;

    let course = app.create_course(&cookie).await;

    assert_eq!(course["title"], "Data Science Foundations");
    assert_eq!(course["originalPrompt"], "Data Science");
    let roadmap = course["roadmap"].as_array().unwrap();
    let lessons = course["lessons"].as_array().unwrap();
    assert_eq!(roadmap.len(), 2);
    assert_eq!(lessons.len(), roadmap.len());
    for (entry, slot) in roadmap.iter().zip(lessons) {
        assert_eq!(entry["title"], slot["title"]);
        assert_eq!(slot["isGenerated"], false);
    }
}

#[tokio::test]
async fn create_course_requires_a_topic() {
    let app = app();
    let cookie = app.sign_up("d@example.com").await;

    let (status, body) = app
        .send("POST", "/courses", Some(&cookie), Some(json!({"topic": "  "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn generation_failure_is_500_without_upstream_text() {
    let app = test_app(
        ScriptedText {
            failing: true,
            ..ScriptedText::default()
        },
        false,
    );
    let cookie = app.sign_up("e@example.com").await;

    let (status, body) = app
        .send("POST", "/courses", Some(&cookie), Some(json!({"topic": "Rust"})))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(!message.contains("sk-secret"));

    let (_, courses) = app.send("GET", "/courses", Some(&cookie), None).await;
    assert_eq!(courses, json!([]));
}

#[tokio::test]
async fn materializing_twice_generates_once() {
    let app = app();
    let cookie = app.sign_up("f@example.com").await;
    let course = app.create_course(&cookie).await;
    let uri = format!("/courses/{}/modules", course["id"].as_str().unwrap());
    let body = json!({"moduleTitle": "Pandas", "moduleDescription": "Working with data frames"});

    let (status, first) = app.send("POST", &uri, Some(&cookie), Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = app.send("POST", &uri, Some(&cookie), Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first, second);
    assert_eq!(app.text.module_calls.load(Ordering::SeqCst), 1);
    assert_eq!(first["title"], "Pandas");
    assert_eq!(first["isGenerated"], true);
    assert_eq!(
        first["notes"],
        json!(["First paragraph.", "Second paragraph."])
    );
    assert_eq!(first["deepDiveTopics"], json!([]));
    assert_eq!(first["flashcards"], json!([]));

    let uri = format!("/courses/{}", course["id"].as_str().unwrap());
    let (_, stored) = app.send("GET", &uri, Some(&cookie), None).await;
    assert_eq!(stored["lessons"][1], first);
    assert_eq!(stored["lessons"][0]["isGenerated"], false);
}

#[tokio::test]
async fn unknown_module_is_404() {
    let app = app();
    let cookie = app.sign_up("g@example.com").await;
    let course = app.create_course(&cookie).await;
    let uri = format!("/courses/{}/modules", course["id"].as_str().unwrap());

    let (status, _) = app
        .send("POST", &uri, Some(&cookie), Some(json!({"moduleTitle": "Knitting"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.text.module_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn other_owners_courses_look_absent() {
    let app = app();
    let owner = app.sign_up("owner@example.com").await;
    let intruder = app.sign_up("intruder@example.com").await;
    let course = app.create_course(&owner).await;
    let id = course["id"].as_str().unwrap();

    let (status, _) = app
        .send("GET", &format!("/courses/{}", id), Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("DELETE", &format!("/courses/{}", id), Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            "POST",
            &format!("/courses/{}/modules", id),
            Some(&intruder),
            Some(json!({"moduleTitle": "Pandas"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = app.send("GET", "/courses", Some(&intruder), None).await;
    assert_eq!(listed, json!([]));

    let (status, _) = app
        .send("GET", &format!("/courses/{}", id), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_course_id_is_404() {
    let app = app();
    let cookie = app.sign_up("h@example.com").await;

    let (status, body) = app
        .send("GET", "/courses/not-a-uuid", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn list_is_newest_first_and_delete_removes() {
    let app = app();
    let cookie = app.sign_up("i@example.com").await;
    let older = app.create_course(&cookie).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = app.create_course(&cookie).await;

    let (status, listed) = app.send("GET", "/courses", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        [newer["id"].as_str().unwrap(), older["id"].as_str().unwrap()]
    );

    let uri = format!("/courses/{}", older["id"].as_str().unwrap());
    let (status, _) = app.send("DELETE", &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attach_videos_stores_results_on_the_slot() {
    let app = app();
    let cookie = app.sign_up("j@example.com").await;
    let course = app.create_course(&cookie).await;
    let id = course["id"].as_str().unwrap();

    let (status, slot) = app
        .send(
            "POST",
            &format!("/courses/{}/modules/videos", id),
            Some(&cookie),
            Some(json!({"moduleTitle": "Statistics"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let videos = slot["youtubeVideos"].as_array().unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0]["title"], "Data Science Foundations Statistics #0");
    assert_eq!(slot["isGenerated"], false);
}

//=========================================================================================
// Study helpers
//=========================================================================================

#[tokio::test]
async fn quiz_rejects_zero_questions() {
    let app = app();
    let cookie = app.sign_up("k@example.com").await;

    let (status, _) = app
        .send(
            "POST",
            "/quiz",
            Some(&cookie),
            Some(json!({"lessonTopic": "Statistics", "questionCount": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, quiz) = app
        .send(
            "POST",
            "/quiz",
            Some(&cookie),
            Some(json!({"lessonTopic": "Statistics", "questionCount": 3})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn search_and_deep_dive_answer_questions() {
    let app = app();
    let cookie = app.sign_up("l@example.com").await;

    let (status, _) = app
        .send("POST", "/search", Some(&cookie), Some(json!({"contextNotes": "notes"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            "POST",
            "/search",
            Some(&cookie),
            Some(json!({"contextNotes": "notes", "userQuestion": "why?"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Because of the central limit theorem.");

    let (status, body) = app
        .send(
            "POST",
            "/deep-dive",
            Some(&cookie),
            Some(json!({"originalText": "notes", "subTopic": "variance"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deeperExplanation"], "More detail.");
}

#[tokio::test]
async fn videos_degrade_to_empty_and_require_a_query() {
    let app = test_app(ScriptedText::default(), true);
    let cookie = app.sign_up("m@example.com").await;

    let (status, body) = app
        .send("POST", "/videos", Some(&cookie), Some(json!({"query": "pandas"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = app
        .send("POST", "/videos", Some(&cookie), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn videos_default_to_configured_count() {
    let app = app();
    let cookie = app.sign_up("n@example.com").await;

    let (status, body) = app
        .send("POST", "/videos", Some(&cookie), Some(json!({"query": "pandas"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = app();
    let cookie = app.sign_up("o@example.com").await;

    let request = Request::builder()
        .method("POST")
        .uri("/courses")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

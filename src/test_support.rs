use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use sqlx::types::Json;
use time::macros::datetime;
use time::PrimitiveDateTime;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tower::ServiceExt;

use crate::api;
use crate::core::{config::Settings, security, state::AppState};
use crate::db::models::{Chapter, Course, Lesson};
use crate::db::types::LessonType;
use crate::repositories::{ContentStore, StoreError};
use crate::services::ids;

const TEST_SECRET_KEY: &str = "test-secret";
const FIXTURE_TIME: PrimitiveDateTime = datetime!(2025-01-01 09:00);

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) store: Arc<MemoryStore>,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<AsyncMutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(AsyncMutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("COURSEWARE_ENV", "test");
    std::env::set_var("COURSEWARE_STRICT_CONFIG", "0");
    std::env::set_var("JWT_SECRET", TEST_SECRET_KEY);
    std::env::remove_var("SECRET_KEY");
    std::env::remove_var("SESSION_COOKIE_NAME");
    std::env::remove_var("SESSION_COOKIE_SECURE");
    std::env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");
    std::env::remove_var("API_V1_STR");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
}

/// Settings loaded under the env lock; the lock is released before returning.
pub(crate) async fn test_settings() -> Settings {
    let _guard = env_lock().await;
    set_test_env();
    Settings::load().expect("settings")
}

pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let store = Arc::new(MemoryStore::default());
    let state = AppState::new(settings, store.clone());
    let app = api::router::router(state.clone());

    TestContext { state, app, store, _guard: guard }
}

/// In-memory [`ContentStore`] for tests. Rows are kept as written so that legacy id
/// spellings survive until read, and each entity kind can be made to fail on demand.
#[derive(Default)]
pub(crate) struct MemoryStore {
    courses: Mutex<Vec<Course>>,
    chapters: Mutex<Vec<Chapter>>,
    lessons: Mutex<Vec<Lesson>>,
    fail_courses: AtomicBool,
    fail_chapters: AtomicBool,
    fail_lessons: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn fail_course_reads(&self, fail: bool) {
        self.fail_courses.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_chapter_reads(&self, fail: bool) {
        self.fail_chapters.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_lesson_reads(&self, fail: bool) {
        self.fail_lessons.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn chapter_count(&self) -> usize {
        self.chapters.lock().expect("chapters").len()
    }

    pub(crate) fn lesson_count(&self) -> usize {
        self.lessons.lock().expect("lessons").len()
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{what} collection offline")))
        } else {
            Ok(())
        }
    }
}

fn replace_where<T: Clone>(rows: &Mutex<Vec<T>>, row: &T, matches: impl Fn(&T) -> bool) -> bool {
    let mut rows = rows.lock().expect("rows");
    match rows.iter_mut().find(|existing| matches(existing)) {
        Some(existing) => {
            *existing = row.clone();
            true
        }
        None => false,
    }
}

fn remove_where<T>(rows: &Mutex<Vec<T>>, matches: impl Fn(&T) -> bool) -> u64 {
    let mut rows = rows.lock().expect("rows");
    let before = rows.len();
    rows.retain(|row| !matches(row));
    (before - rows.len()) as u64
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Self::check(&self.fail_courses, "courses")
    }

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError> {
        self.courses.lock().expect("courses").push(course.clone());
        Ok(())
    }

    async fn find_course(&self, course_id: &str) -> Result<Option<Course>, StoreError> {
        Self::check(&self.fail_courses, "courses")?;
        let courses = self.courses.lock().expect("courses");
        Ok(courses
            .iter()
            .find(|course| ids::same_id(&course.id, course_id))
            .cloned()
            .map(Course::into_canonical))
    }

    async fn list_courses(&self, published_only: bool) -> Result<Vec<Course>, StoreError> {
        Self::check(&self.fail_courses, "courses")?;
        let courses = self.courses.lock().expect("courses");
        Ok(courses
            .iter()
            .filter(|course| !published_only || course.is_published)
            .cloned()
            .map(Course::into_canonical)
            .collect())
    }

    async fn save_course(&self, course: &Course) -> Result<bool, StoreError> {
        Ok(replace_where(&self.courses, course, |existing| ids::same_id(&existing.id, &course.id)))
    }

    async fn delete_course(&self, course_id: &str) -> Result<bool, StoreError> {
        Ok(remove_where(&self.courses, |course| ids::same_id(&course.id, course_id)) > 0)
    }

    async fn insert_chapter(&self, chapter: &Chapter) -> Result<(), StoreError> {
        self.chapters.lock().expect("chapters").push(chapter.clone());
        Ok(())
    }

    async fn find_chapter(&self, chapter_id: &str) -> Result<Option<Chapter>, StoreError> {
        Self::check(&self.fail_chapters, "chapters")?;
        let chapters = self.chapters.lock().expect("chapters");
        Ok(chapters
            .iter()
            .find(|chapter| ids::same_id(&chapter.id, chapter_id))
            .cloned()
            .map(Chapter::into_canonical))
    }

    async fn list_chapters(&self, course_refs: &[String]) -> Result<Vec<Chapter>, StoreError> {
        Self::check(&self.fail_chapters, "chapters")?;
        let chapters = self.chapters.lock().expect("chapters");
        Ok(chapters
            .iter()
            .filter(|chapter| course_refs.contains(&chapter.course_id))
            .cloned()
            .map(Chapter::into_canonical)
            .collect())
    }

    async fn save_chapter(&self, chapter: &Chapter) -> Result<bool, StoreError> {
        Ok(replace_where(&self.chapters, chapter, |existing| {
            ids::same_id(&existing.id, &chapter.id)
        }))
    }

    async fn delete_chapter(&self, chapter_id: &str) -> Result<bool, StoreError> {
        Ok(remove_where(&self.chapters, |chapter| ids::same_id(&chapter.id, chapter_id)) > 0)
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError> {
        self.lessons.lock().expect("lessons").push(lesson.clone());
        Ok(())
    }

    async fn find_lesson(&self, lesson_id: &str) -> Result<Option<Lesson>, StoreError> {
        Self::check(&self.fail_lessons, "lessons")?;
        let lessons = self.lessons.lock().expect("lessons");
        Ok(lessons
            .iter()
            .find(|lesson| ids::same_id(&lesson.id, lesson_id))
            .cloned()
            .map(Lesson::into_canonical))
    }

    async fn list_lessons(&self, chapter_id: &str) -> Result<Vec<Lesson>, StoreError> {
        Self::check(&self.fail_lessons, "lessons")?;
        let refs = ids::representations(chapter_id);
        let lessons = self.lessons.lock().expect("lessons");
        Ok(lessons
            .iter()
            .filter(|lesson| refs.contains(&lesson.chapter_id))
            .cloned()
            .map(Lesson::into_canonical)
            .collect())
    }

    async fn save_lesson(&self, lesson: &Lesson) -> Result<bool, StoreError> {
        Ok(replace_where(&self.lessons, lesson, |existing| ids::same_id(&existing.id, &lesson.id)))
    }

    async fn delete_lesson(&self, lesson_id: &str) -> Result<bool, StoreError> {
        Ok(remove_where(&self.lessons, |lesson| ids::same_id(&lesson.id, lesson_id)) > 0)
    }

    async fn delete_lessons_for_chapter(&self, chapter_id: &str) -> Result<u64, StoreError> {
        let refs = ids::representations(chapter_id);
        Ok(remove_where(&self.lessons, |lesson| refs.contains(&lesson.chapter_id)))
    }
}

pub(crate) fn course_fixture(
    id: &str,
    owner_id: &str,
    published: bool,
    enrolled: &[&str],
) -> Course {
    Course {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        title: format!("Course {id}"),
        description: Some("Fixture course".to_string()),
        category: Some("testing".to_string()),
        price: 0.0,
        enrolled_users: Json(enrolled.iter().map(|user| user.to_string()).collect()),
        is_published: published,
        created_at: FIXTURE_TIME,
        updated_at: FIXTURE_TIME,
    }
}

pub(crate) fn chapter_fixture(id: &str, course_id: &str, position: i32) -> Chapter {
    Chapter {
        id: id.to_string(),
        course_id: course_id.to_string(),
        title: format!("Chapter {id}"),
        position,
        is_published: true,
        created_at: FIXTURE_TIME,
        updated_at: FIXTURE_TIME,
    }
}

/// A text lesson with placeholder content.
pub(crate) fn lesson_fixture(id: &str, chapter_id: &str, course_id: &str, position: i32) -> Lesson {
    Lesson {
        id: id.to_string(),
        chapter_id: chapter_id.to_string(),
        course_id: course_id.to_string(),
        title: format!("Lesson {id}"),
        description: String::new(),
        content: Some(format!("<p>{id}</p>")),
        video_url: None,
        lesson_type: LessonType::Text,
        duration: 5,
        is_free: false,
        position,
        attachments: Json(Vec::new()),
        created_at: FIXTURE_TIME,
        updated_at: FIXTURE_TIME,
    }
}

/// Course with one chapter holding one text lesson and one free video lesson.
pub(crate) async fn seed_course_tree(
    store: &MemoryStore,
    course_id: &str,
    owner_id: &str,
    published: bool,
    enrolled: &[&str],
) -> Course {
    let course = course_fixture(course_id, owner_id, published, enrolled);
    store.insert_course(&course).await.expect("course");

    let chapter_id = format!("{course_id}-ch1");
    store.insert_chapter(&chapter_fixture(&chapter_id, course_id, 0)).await.expect("chapter");
    store
        .insert_lesson(&lesson_fixture(&format!("{course_id}-l1"), &chapter_id, course_id, 0))
        .await
        .expect("lesson");

    let mut preview = lesson_fixture(&format!("{course_id}-free"), &chapter_id, course_id, 1);
    preview.lesson_type = LessonType::Video;
    preview.content = None;
    preview.video_url = Some("https://cdn.test/preview.mp4".to_string());
    preview.is_free = true;
    store.insert_lesson(&preview).await.expect("preview lesson");

    course.into_canonical()
}

pub(crate) fn token_for(role: &str, subject: &str, settings: &Settings) -> String {
    security::create_access_token(subject, role, settings, None).expect("token")
}

/// How a request carries its session.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Auth<'a> {
    None,
    Bearer(&'a str),
    Cookie(&'a str),
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    auth: Auth<'_>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    match body {
        Some(body) => {
            raw_request(method, uri, auth, serde_json::to_vec(&body).expect("serialize body"))
        }
        None => request_builder(method, uri, auth).body(Body::empty()).expect("request body"),
    }
}

/// Sends `body` as-is with a JSON content type, for payloads that are not valid JSON.
pub(crate) fn raw_request(
    method: Method,
    uri: &str,
    auth: Auth<'_>,
    body: impl Into<Body>,
) -> Request<Body> {
    request_builder(method, uri, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request body")
}

fn request_builder(method: Method, uri: &str, auth: Auth<'_>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match auth {
        Auth::None => builder,
        Auth::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        Auth::Cookie(token) => {
            builder.header(header::COOKIE, format!("theme=dark; token={token}"))
        }
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}

/// Runs one request through the router. Empty bodies come back as `Null`.
pub(crate) async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    if body.is_empty() {
        return (status, serde_json::Value::Null);
    }
    let json = serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    });
    (status, json)
}

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{load_visible_course, CurrentIdentity, OptionalIdentity};
use crate::api::validation::{decode_body, non_blank, parse_lesson_type};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Attachment, Chapter, Lesson};
use crate::schemas::lesson::{LessonCreate, LessonParent, LessonResponse, LessonUpdate};
use crate::services::assembler::{next_position, sort_lessons};
use crate::services::identity::Identity;
use crate::services::lesson_content::normalize_body;
use crate::services::ownership::{authorize_mutation, MutationTarget};
use crate::services::ids;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_lesson))
        .route("/chapter/:chapter_id", get(list_lessons))
        .route(
            "/:lesson_id/chapter/:chapter_id",
            get(get_lesson).put(update_lesson).delete(delete_lesson),
        )
}

async fn fetch_chapter(state: &AppState, chapter_id: &str) -> Result<Chapter, ApiError> {
    state
        .store()
        .find_chapter(chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch chapter"))?
        .ok_or_else(|| ApiError::not_found("Chapter"))
}

/// A lesson addressed through a chapter it does not belong to is treated as missing.
async fn fetch_lesson_in_chapter(
    state: &AppState,
    lesson_id: &str,
    chapter_id: &str,
) -> Result<Lesson, ApiError> {
    state
        .store()
        .find_lesson(lesson_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch lesson"))?
        .filter(|lesson| ids::same_id(&lesson.chapter_id, chapter_id))
        .ok_or_else(|| ApiError::not_found("Lesson"))
}

async fn chapter_lessons(state: &AppState, chapter_id: &str) -> Result<Vec<Lesson>, ApiError> {
    let mut lessons = state
        .store()
        .list_lessons(chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lessons"))?;
    sort_lessons(&mut lessons);
    Ok(lessons)
}

/// Callers without full access to the course only see free preview lessons.
async fn list_lessons(
    Path(chapter_id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<LessonResponse>>, ApiError> {
    let chapter = fetch_chapter(&state, &ids::normalize(&chapter_id)).await?;
    let (_, visibility) = load_visible_course(&state, &identity, &chapter.course_id).await?;

    let lessons = chapter_lessons(&state, &chapter.id).await?;
    Ok(Json(
        lessons
            .into_iter()
            .filter(|lesson| visibility.show_full_content || lesson.is_free)
            .map(LessonResponse::from_db)
            .collect(),
    ))
}

async fn get_lesson(
    Path((lesson_id, chapter_id)): Path<(String, String)>,
    OptionalIdentity(identity): OptionalIdentity,
    State(state): State<AppState>,
) -> Result<Json<LessonResponse>, ApiError> {
    let chapter = fetch_chapter(&state, &ids::normalize(&chapter_id)).await?;
    let (_, visibility) = load_visible_course(&state, &identity, &chapter.course_id).await?;

    let lesson = fetch_lesson_in_chapter(&state, &ids::normalize(&lesson_id), &chapter.id).await?;
    if !visibility.show_full_content && !lesson.is_free {
        return Err(ApiError::not_found("Lesson"));
    }

    Ok(Json(LessonResponse::from_db(lesson)))
}

async fn create_lesson(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    raw_body: Bytes,
) -> Result<(StatusCode, Json<LessonResponse>), ApiError> {
    let parent: LessonParent = decode_body(&raw_body)?;
    let chapter_id = ids::normalize(&parent.chapter_id);
    authorize_mutation(state.store(), &identity, MutationTarget::Chapter(&chapter_id)).await?;

    let payload: LessonCreate = decode_body(&raw_body)?;
    payload.validate()?;
    let title = non_blank("title", &payload.title)?;
    let lesson_type = parse_lesson_type(&payload.lesson_type)?;
    let body =
        normalize_body(lesson_type, payload.content.as_deref(), payload.video_url.as_deref())?;

    let chapter = fetch_chapter(&state, &chapter_id).await?;
    if let Some(course_id) = payload.course_id.as_deref() {
        if !ids::same_id(course_id, &chapter.course_id) {
            return Err(ApiError::validation(
                "course_id",
                "course_id does not match the chapter's course",
            ));
        }
    }

    let position = match payload.position {
        Some(position) => position,
        None => next_position(
            chapter_lessons(&state, &chapter.id).await?.iter().map(|lesson| lesson.position),
        ),
    };

    let now = primitive_now_utc();
    let lesson = Lesson {
        id: Uuid::new_v4().to_string(),
        chapter_id: chapter.id,
        course_id: chapter.course_id,
        title,
        description: payload.description,
        content: body.content,
        video_url: body.video_url,
        lesson_type,
        duration: payload.duration,
        is_free: payload.is_free,
        position,
        attachments: SqlJson(payload.attachments.into_iter().map(Attachment::from).collect()),
        created_at: now,
        updated_at: now,
    };
    state
        .store()
        .insert_lesson(&lesson)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create lesson"))?;

    log_mutation("create_lesson", &identity, &lesson);
    Ok((StatusCode::CREATED, Json(LessonResponse::from_db(lesson))))
}

/// Partial update. When the lesson type changes, the stored body of the old type
/// is not carried over; the request must supply the new one.
async fn update_lesson(
    Path((lesson_id, chapter_id)): Path<(String, String)>,
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    raw_body: Bytes,
) -> Result<Json<LessonResponse>, ApiError> {
    let lesson_id = ids::normalize(&lesson_id);
    let chapter_id = ids::normalize(&chapter_id);
    authorize_mutation(
        state.store(),
        &identity,
        MutationTarget::Lesson { lesson_id: &lesson_id, chapter_id: &chapter_id },
    )
    .await?;
    let payload: LessonUpdate = decode_body(&raw_body)?;
    payload.validate()?;

    let mut lesson = fetch_lesson_in_chapter(&state, &lesson_id, &chapter_id).await?;

    let lesson_type = match payload.lesson_type.as_deref() {
        Some(raw) => parse_lesson_type(raw)?,
        None => lesson.lesson_type,
    };
    let type_changed = lesson_type != lesson.lesson_type;
    let carried = |current: &Option<String>| if type_changed { None } else { current.clone() };
    let content = payload.content.or_else(|| carried(&lesson.content));
    let video_url = payload.video_url.or_else(|| carried(&lesson.video_url));
    let body = normalize_body(lesson_type, content.as_deref(), video_url.as_deref())?;

    if let Some(title) = payload.title.as_deref() {
        lesson.title = non_blank("title", title)?;
    }
    if let Some(description) = payload.description {
        lesson.description = description;
    }
    if let Some(duration) = payload.duration {
        lesson.duration = duration;
    }
    if let Some(is_free) = payload.is_free {
        lesson.is_free = is_free;
    }
    if let Some(position) = payload.position {
        lesson.position = position;
    }
    if let Some(attachments) = payload.attachments {
        lesson.attachments = SqlJson(attachments.into_iter().map(Attachment::from).collect());
    }
    lesson.lesson_type = lesson_type;
    lesson.content = body.content;
    lesson.video_url = body.video_url;
    lesson.updated_at = primitive_now_utc();

    let saved = state
        .store()
        .save_lesson(&lesson)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update lesson"))?;
    if !saved {
        return Err(ApiError::not_found("Lesson"));
    }

    log_mutation("update_lesson", &identity, &lesson);
    Ok(Json(LessonResponse::from_db(lesson)))
}

async fn delete_lesson(
    Path((lesson_id, chapter_id)): Path<(String, String)>,
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let lesson_id = ids::normalize(&lesson_id);
    let chapter_id = ids::normalize(&chapter_id);
    authorize_mutation(
        state.store(),
        &identity,
        MutationTarget::Lesson { lesson_id: &lesson_id, chapter_id: &chapter_id },
    )
    .await?;

    let lesson = fetch_lesson_in_chapter(&state, &lesson_id, &chapter_id).await?;
    let deleted = state
        .store()
        .delete_lesson(&lesson.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete lesson"))?;
    if !deleted {
        return Err(ApiError::not_found("Lesson"));
    }

    log_mutation("delete_lesson", &identity, &lesson);
    Ok(StatusCode::NO_CONTENT)
}

fn log_mutation(action: &'static str, identity: &Identity, lesson: &Lesson) {
    tracing::info!(
        action,
        actor_id = identity.label(),
        course_id = %lesson.course_id,
        chapter_id = %lesson.chapter_id,
        lesson_id = %lesson.id,
        lesson_type = lesson.lesson_type.as_str(),
        "lesson mutation applied"
    );
}

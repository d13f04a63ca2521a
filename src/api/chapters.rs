use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{load_visible_course, CurrentIdentity, OptionalIdentity};
use crate::api::validation::{decode_body, non_blank};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Chapter;
use crate::schemas::chapter::{ChapterCreate, ChapterParent, ChapterResponse, ChapterUpdate};
use crate::services::assembler::{next_position, sort_chapters};
use crate::services::identity::Identity;
use crate::services::ownership::{authorize_mutation, MutationTarget};
use crate::services::ids;

// `GET /:id` takes a course id while `PUT` and `DELETE` take a chapter id.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_chapter))
        .route("/:id", get(list_chapters).put(update_chapter).delete(delete_chapter))
        .route("/:id/published", get(list_published_chapters))
}

async fn course_chapters(state: &AppState, course_id: &str) -> Result<Vec<Chapter>, ApiError> {
    let mut chapters = state
        .store()
        .list_chapters(&ids::representations(course_id))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list chapters"))?;
    sort_chapters(&mut chapters);
    Ok(chapters)
}

/// Every chapter, published or not, for callers with full access to the course.
/// Outline-only callers get an empty list, matching the course endpoint.
async fn list_chapters(
    Path(course_id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<ChapterResponse>>, ApiError> {
    let (course, visibility) = load_visible_course(&state, &identity, &course_id).await?;
    if !visibility.show_full_content {
        return Ok(Json(Vec::new()));
    }

    let chapters = course_chapters(&state, &course.id).await?;
    Ok(Json(chapters.into_iter().map(ChapterResponse::from_db).collect()))
}

async fn list_published_chapters(
    Path(course_id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<ChapterResponse>>, ApiError> {
    let (course, _) = load_visible_course(&state, &identity, &course_id).await?;

    let chapters = course_chapters(&state, &course.id).await?;
    Ok(Json(
        chapters
            .into_iter()
            .filter(|chapter| chapter.is_published)
            .map(ChapterResponse::from_db)
            .collect(),
    ))
}

async fn create_chapter(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ChapterResponse>), ApiError> {
    let parent: ChapterParent = decode_body(&body)?;
    let course_id = ids::normalize(&parent.course_id);
    authorize_mutation(state.store(), &identity, MutationTarget::Course(&course_id)).await?;
    let payload: ChapterCreate = decode_body(&body)?;
    payload.validate()?;
    let is_published = payload.publish.resolve()?.unwrap_or(false);
    let title = non_blank("title", &payload.title)?;

    let position = match payload.position {
        Some(position) => position,
        None => next_position(
            course_chapters(&state, &course_id).await?.iter().map(|chapter| chapter.position),
        ),
    };

    let now = primitive_now_utc();
    let chapter = Chapter {
        id: Uuid::new_v4().to_string(),
        course_id,
        title,
        position,
        is_published,
        created_at: now,
        updated_at: now,
    };
    state
        .store()
        .insert_chapter(&chapter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create chapter"))?;

    log_mutation("create_chapter", &identity, &chapter);
    Ok((StatusCode::CREATED, Json(ChapterResponse::from_db(chapter))))
}

async fn update_chapter(
    Path(chapter_id): Path<String>,
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChapterResponse>, ApiError> {
    let chapter_id = ids::normalize(&chapter_id);
    authorize_mutation(state.store(), &identity, MutationTarget::Chapter(&chapter_id)).await?;
    let payload: ChapterUpdate = decode_body(&body)?;
    payload.validate()?;
    let publish = payload.publish.resolve()?;

    let mut chapter = state
        .store()
        .find_chapter(&chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch chapter"))?
        .ok_or_else(|| ApiError::not_found("Chapter"))?;

    if let Some(title) = payload.title.as_deref() {
        chapter.title = non_blank("title", title)?;
    }
    if let Some(position) = payload.position {
        chapter.position = position;
    }
    if let Some(is_published) = publish {
        chapter.is_published = is_published;
    }
    chapter.updated_at = primitive_now_utc();

    let saved = state
        .store()
        .save_chapter(&chapter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update chapter"))?;
    if !saved {
        return Err(ApiError::not_found("Chapter"));
    }

    log_mutation("update_chapter", &identity, &chapter);
    Ok(Json(ChapterResponse::from_db(chapter)))
}

async fn delete_chapter(
    Path(chapter_id): Path<String>,
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let chapter_id = ids::normalize(&chapter_id);
    authorize_mutation(state.store(), &identity, MutationTarget::Chapter(&chapter_id)).await?;

    let lessons_deleted = state
        .store()
        .delete_lessons_for_chapter(&chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete chapter lessons"))?;
    let deleted = state
        .store()
        .delete_chapter(&chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete chapter"))?;
    if !deleted {
        return Err(ApiError::not_found("Chapter"));
    }

    tracing::info!(
        action = "delete_chapter",
        actor_id = identity.label(),
        chapter_id = %chapter_id,
        lessons_deleted,
        "chapter deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

fn log_mutation(action: &'static str, identity: &Identity, chapter: &Chapter) {
    tracing::info!(
        action,
        actor_id = identity.label(),
        course_id = %chapter.course_id,
        chapter_id = %chapter.id,
        position = chapter.position,
        "chapter saved"
    );
}

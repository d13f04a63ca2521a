use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{load_visible_course, CurrentIdentity, OptionalIdentity};
use crate::api::validation::{decode_body, non_blank};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Course;
use crate::schemas::course::{CourseCreate, CourseResponse, CourseUpdate, EnrollmentUpdate};
use crate::services::identity::Identity;
use crate::services::ownership::{authorize_mutation, AccessError, MutationTarget};
use crate::services::{assembler, enrollment, ids};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/:course_id", get(get_course).patch(update_course).delete(delete_course))
        .route("/:course_id/enrollments", put(replace_enrollment))
}

async fn list_courses(
    OptionalIdentity(identity): OptionalIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let published_only = !matches!(identity, Identity::Admin { .. } | Identity::Teacher { .. });
    let courses = state
        .store()
        .list_courses(published_only)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    // Teachers see every published course plus their own drafts.
    let response = courses
        .into_iter()
        .filter(|course| course.is_published || identity.can_mutate(course))
        .map(|course| {
            let show_enrollment = identity.can_mutate(&course);
            CourseResponse::from_db(course, show_enrollment)
        })
        .collect();

    Ok(Json(response))
}

async fn create_course(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let Some(owner_id) = identity.subject_id().filter(|_| identity.can_author()) else {
        return Err(AccessError::Forbidden("role_not_permitted").into());
    };
    let payload: CourseCreate = decode_body(&body)?;
    payload.validate()?;
    let title = non_blank("title", &payload.title)?;

    let now = primitive_now_utc();
    let course = Course {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        title,
        description: payload.description,
        category: payload.category,
        price: payload.price,
        enrolled_users: SqlJson(Vec::new()),
        is_published: false,
        created_at: now,
        updated_at: now,
    };

    state
        .store()
        .insert_course(&course)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    tracing::info!(
        action = "create_course",
        actor_id = identity.label(),
        course_id = %course.id,
        "course created"
    );
    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course, true))))
}

async fn get_course(
    Path(course_id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    State(state): State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let (course, visibility) = load_visible_course(&state, &identity, &course_id).await?;
    let show_enrollment = identity.can_mutate(&course);

    let assembled = assembler::assemble(state.store(), course, visibility.show_full_content).await;
    Ok(Json(CourseResponse::with_content(assembled, show_enrollment)))
}

async fn update_course(
    Path(course_id): Path<String>,
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CourseResponse>, ApiError> {
    let course_id = ids::normalize(&course_id);
    authorize_mutation(state.store(), &identity, MutationTarget::Course(&course_id)).await?;
    let payload: CourseUpdate = decode_body(&body)?;
    payload.validate()?;
    let publish = payload.publish.resolve()?;

    let mut course = state
        .store()
        .find_course(&course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    if let Some(title) = payload.title.as_deref() {
        course.title = non_blank("title", title)?;
    }
    if let Some(description) = payload.description {
        course.description = Some(description);
    }
    if let Some(category) = payload.category {
        course.category = Some(category);
    }
    if let Some(price) = payload.price {
        course.price = price;
    }
    if let Some(enrolled_users) = payload.enrolled_users {
        enrollment::replace_enrolled_users(&mut course, enrolled_users);
    }
    if let Some(is_published) = publish {
        course.is_published = is_published;
    }
    course.updated_at = primitive_now_utc();

    let saved = state
        .store()
        .save_course(&course)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update course"))?;
    if !saved {
        return Err(ApiError::not_found("Course"));
    }

    tracing::info!(
        action = "update_course",
        actor_id = identity.label(),
        course_id = %course.id,
        is_published = course.is_published,
        "course updated"
    );
    Ok(Json(CourseResponse::from_db(course, true)))
}

async fn replace_enrollment(
    Path(course_id): Path<String>,
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CourseResponse>, ApiError> {
    let course_id = ids::normalize(&course_id);
    authorize_mutation(state.store(), &identity, MutationTarget::Course(&course_id)).await?;
    let payload: EnrollmentUpdate = decode_body(&body)?;

    let course =
        enrollment::set_enrollment(state.store(), &identity, &course_id, &payload.enrolled_users)
            .await?;
    Ok(Json(CourseResponse::from_db(course, true)))
}

/// Lessons go first, then chapters, then the course. Each delete stands alone, so
/// a failure part way leaves the remaining children orphaned but unreachable.
async fn delete_course(
    Path(course_id): Path<String>,
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let course_id = ids::normalize(&course_id);
    authorize_mutation(state.store(), &identity, MutationTarget::Course(&course_id)).await?;

    let store = state.store();
    let chapters = store
        .list_chapters(&ids::representations(&course_id))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list chapters for deletion"))?;

    let mut lessons_deleted = 0;
    for chapter in &chapters {
        lessons_deleted += store
            .delete_lessons_for_chapter(&chapter.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete chapter lessons"))?;
        store
            .delete_chapter(&chapter.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete chapter"))?;
    }

    let deleted = store
        .delete_course(&course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;
    if !deleted {
        return Err(ApiError::not_found("Course"));
    }

    tracing::info!(
        action = "delete_course",
        actor_id = identity.label(),
        course_id = %course_id,
        chapters_deleted = chapters.len(),
        lessons_deleted,
        "course deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

use thiserror::Error;

use crate::repositories::{ContentStore, StoreError};
use crate::services::identity::Identity;
use crate::services::ids;

#[derive(Debug, Error)]
pub(crate) enum AccessError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a mutation touches. Chapter and lesson targets are resolved to their
/// course through the chapter record. A lesson must also belong to the chapter
/// it is addressed through.
#[derive(Debug, Clone, Copy)]
pub(crate) enum MutationTarget<'a> {
    Course(&'a str),
    Chapter(&'a str),
    Lesson { lesson_id: &'a str, chapter_id: &'a str },
}

/// Must run before any write. Ownership is re-read from the store on every
/// call; nothing is cached between requests.
pub(crate) async fn authorize_mutation(
    store: &dyn ContentStore,
    identity: &Identity,
    target: MutationTarget<'_>,
) -> Result<(), AccessError> {
    match identity {
        Identity::Anonymous => return Err(AccessError::Unauthenticated),
        Identity::Admin { .. } => return Ok(()),
        Identity::Student { .. } => return Err(AccessError::Forbidden("role_not_permitted")),
        Identity::Teacher { .. } => {}
    }

    let course_id = match target {
        MutationTarget::Course(course_id) => course_id.to_string(),
        MutationTarget::Chapter(chapter_id) | MutationTarget::Lesson { chapter_id, .. } => {
            store
                .find_chapter(chapter_id)
                .await?
                .ok_or(AccessError::NotFound("Chapter"))?
                .course_id
        }
    };

    let course = store.find_course(&course_id).await?.ok_or(AccessError::NotFound("Course"))?;

    if !identity.can_mutate(&course) {
        tracing::debug!(
            subject_id = identity.label(),
            course_id = %course.id,
            target = ?target,
            "mutation denied: not the course owner"
        );
        return Err(AccessError::Forbidden("not_owner"));
    }

    if let MutationTarget::Lesson { lesson_id, chapter_id } = target {
        let in_chapter = store
            .find_lesson(lesson_id)
            .await?
            .is_some_and(|lesson| ids::same_id(&lesson.chapter_id, chapter_id));
        if !in_chapter {
            return Err(AccessError::NotFound("Lesson"));
        }
    }

    Ok(())
}

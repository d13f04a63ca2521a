use sqlx::types::Json;

use crate::core::time::primitive_now_utc;
use crate::db::models::Course;
use crate::repositories::ContentStore;
use crate::services::identity::Identity;
use crate::services::ids;
use crate::services::ownership::{self, AccessError, MutationTarget};

/// Full replacement of the enrollment list. Entries are canonicalised, blanks are
/// dropped and duplicates collapse, so applying the same list twice is a no-op.
pub(crate) fn replace_enrolled_users<I, S>(course: &mut Course, user_ids: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    course.enrolled_users = Json(ids::normalize_list(user_ids));
}

/// Read-modify-write of the whole course. Concurrent callers are last-writer-wins.
pub(crate) async fn set_enrollment(
    store: &dyn ContentStore,
    identity: &Identity,
    course_id: &str,
    user_ids: &[String],
) -> Result<Course, AccessError> {
    let course_id = ids::normalize(course_id);
    ownership::authorize_mutation(store, identity, MutationTarget::Course(&course_id)).await?;

    let mut course = store.find_course(&course_id).await?.ok_or(AccessError::NotFound("Course"))?;
    replace_enrolled_users(&mut course, user_ids);
    course.updated_at = primitive_now_utc();

    if !store.save_course(&course).await? {
        return Err(AccessError::NotFound("Course"));
    }

    tracing::info!(
        action = "set_enrollment",
        actor_id = identity.label(),
        course_id = %course.id,
        enrolled = course.enrolled_user_ids().len(),
        "course enrollment replaced"
    );
    Ok(course)
}

use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::Course;

const COURSE_COLUMNS: &str = "id, owner_id, title, description, category, price, enrolled_users, \
     is_published, created_at, updated_at";

pub(crate) async fn create(pool: &PgPool, course: &Course) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO courses (
            id, owner_id, title, description, category, price, enrolled_users,
            is_published, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
    )
    .bind(&course.id)
    .bind(&course.owner_id)
    .bind(&course.title)
    .bind(&course.description)
    .bind(&course.category)
    .bind(course.price)
    .bind(Json(&course.enrolled_users.0))
    .bind(course.is_published)
    .bind(course.created_at)
    .bind(course.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool, published_only: bool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS}
         FROM courses
         WHERE ($1 = FALSE OR is_published = TRUE)
         ORDER BY created_at DESC, id"
    ))
    .bind(published_only)
    .fetch_all(pool)
    .await
}

/// Whole-document replace; concurrent writers are last-writer-wins.
pub(crate) async fn replace(pool: &PgPool, course: &Course) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE courses SET
            owner_id = $1,
            title = $2,
            description = $3,
            category = $4,
            price = $5,
            enrolled_users = $6,
            is_published = $7,
            updated_at = $8
         WHERE id = $9",
    )
    .bind(&course.owner_id)
    .bind(&course.title)
    .bind(&course.description)
    .bind(&course.category)
    .bind(course.price)
    .bind(Json(&course.enrolled_users.0))
    .bind(course.is_published)
    .bind(course.updated_at)
    .bind(&course.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(pool: &PgPool, course_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM courses WHERE id = $1").bind(course_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

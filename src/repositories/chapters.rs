use sqlx::PgPool;

use crate::db::models::Chapter;

const CHAPTER_COLUMNS: &str =
    "id, course_id, title, position, is_published, created_at, updated_at";

pub(crate) async fn create(pool: &PgPool, chapter: &Chapter) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO chapters (id, course_id, title, position, is_published, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)",
    )
    .bind(&chapter.id)
    .bind(&chapter.course_id)
    .bind(&chapter.title)
    .bind(chapter.position)
    .bind(chapter.is_published)
    .bind(chapter.created_at)
    .bind(chapter.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    chapter_id: &str,
) -> Result<Option<Chapter>, sqlx::Error> {
    sqlx::query_as::<_, Chapter>(&format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1"))
        .bind(chapter_id)
        .fetch_optional(pool)
        .await
}

/// `course_refs` holds every spelling of the parent id that may be stored.
pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_refs: &[String],
) -> Result<Vec<Chapter>, sqlx::Error> {
    sqlx::query_as::<_, Chapter>(&format!(
        "SELECT {CHAPTER_COLUMNS}
         FROM chapters
         WHERE course_id = ANY($1)
         ORDER BY position, created_at, id"
    ))
    .bind(course_refs)
    .fetch_all(pool)
    .await
}

pub(crate) async fn replace(pool: &PgPool, chapter: &Chapter) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE chapters SET
            course_id = $1,
            title = $2,
            position = $3,
            is_published = $4,
            updated_at = $5
         WHERE id = $6",
    )
    .bind(&chapter.course_id)
    .bind(&chapter.title)
    .bind(chapter.position)
    .bind(chapter.is_published)
    .bind(chapter.updated_at)
    .bind(&chapter.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(pool: &PgPool, chapter_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM chapters WHERE id = $1").bind(chapter_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

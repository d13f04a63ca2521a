use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::Lesson;

const LESSON_COLUMNS: &str = "id, chapter_id, course_id, title, description, content, video_url, \
     lesson_type, duration, is_free, position, attachments, created_at, updated_at";

pub(crate) async fn create(pool: &PgPool, lesson: &Lesson) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO lessons (
            id, chapter_id, course_id, title, description, content, video_url,
            lesson_type, duration, is_free, position, attachments, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)",
    )
    .bind(&lesson.id)
    .bind(&lesson.chapter_id)
    .bind(&lesson.course_id)
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(&lesson.content)
    .bind(&lesson.video_url)
    .bind(lesson.lesson_type)
    .bind(lesson.duration)
    .bind(lesson.is_free)
    .bind(lesson.position)
    .bind(Json(&lesson.attachments.0))
    .bind(lesson.created_at)
    .bind(lesson.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    lesson_id: &str,
) -> Result<Option<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"))
        .bind(lesson_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_chapter(
    pool: &PgPool,
    chapter_refs: &[String],
) -> Result<Vec<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {LESSON_COLUMNS}
         FROM lessons
         WHERE chapter_id = ANY($1)
         ORDER BY position, created_at, id"
    ))
    .bind(chapter_refs)
    .fetch_all(pool)
    .await
}

pub(crate) async fn replace(pool: &PgPool, lesson: &Lesson) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE lessons SET
            chapter_id = $1,
            course_id = $2,
            title = $3,
            description = $4,
            content = $5,
            video_url = $6,
            lesson_type = $7,
            duration = $8,
            is_free = $9,
            position = $10,
            attachments = $11,
            updated_at = $12
         WHERE id = $13",
    )
    .bind(&lesson.chapter_id)
    .bind(&lesson.course_id)
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(&lesson.content)
    .bind(&lesson.video_url)
    .bind(lesson.lesson_type)
    .bind(lesson.duration)
    .bind(lesson.is_free)
    .bind(lesson.position)
    .bind(Json(&lesson.attachments.0))
    .bind(lesson.updated_at)
    .bind(&lesson.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(pool: &PgPool, lesson_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM lessons WHERE id = $1").bind(lesson_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_for_chapter(
    pool: &PgPool,
    chapter_refs: &[String],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM lessons WHERE chapter_id = ANY($1)")
        .bind(chapter_refs)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::{Chapter, Course, Lesson};
use crate::repositories::{chapters, courses, lessons};
use crate::services::ids;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

// An exhausted or closed pool is an outage rather than a failed query.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::Unavailable(err.to_string())
            }
            other => Self::Database(other),
        }
    }
}

/// Document-style access to courses, chapters and lessons.
///
/// Every entity is read and written as a whole; there is no transaction
/// spanning several calls, so multi-step operations such as cascading deletes
/// can be interrupted halfway. Ids are canonicalised on the way in and on the
/// way out.
#[async_trait]
pub(crate) trait ContentStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError>;
    async fn find_course(&self, course_id: &str) -> Result<Option<Course>, StoreError>;
    async fn list_courses(&self, published_only: bool) -> Result<Vec<Course>, StoreError>;
    /// Returns `false` when the course no longer exists.
    async fn save_course(&self, course: &Course) -> Result<bool, StoreError>;
    async fn delete_course(&self, course_id: &str) -> Result<bool, StoreError>;

    async fn insert_chapter(&self, chapter: &Chapter) -> Result<(), StoreError>;
    async fn find_chapter(&self, chapter_id: &str) -> Result<Option<Chapter>, StoreError>;
    /// Chapters whose stored `course_id` equals any of `course_refs`, ordered by
    /// position and then by insertion.
    async fn list_chapters(&self, course_refs: &[String]) -> Result<Vec<Chapter>, StoreError>;
    async fn save_chapter(&self, chapter: &Chapter) -> Result<bool, StoreError>;
    async fn delete_chapter(&self, chapter_id: &str) -> Result<bool, StoreError>;

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError>;
    async fn find_lesson(&self, lesson_id: &str) -> Result<Option<Lesson>, StoreError>;
    async fn list_lessons(&self, chapter_id: &str) -> Result<Vec<Lesson>, StoreError>;
    async fn save_lesson(&self, lesson: &Lesson) -> Result<bool, StoreError>;
    async fn delete_lesson(&self, lesson_id: &str) -> Result<bool, StoreError>;
    async fn delete_lessons_for_chapter(&self, chapter_id: &str) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub(crate) struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError> {
        let course = course.clone().into_canonical();
        Ok(courses::create(&self.pool, &course).await?)
    }

    async fn find_course(&self, course_id: &str) -> Result<Option<Course>, StoreError> {
        let course_id = ids::normalize(course_id);
        let course = courses::find_by_id(&self.pool, &course_id).await?;
        Ok(course.map(Course::into_canonical))
    }

    async fn list_courses(&self, published_only: bool) -> Result<Vec<Course>, StoreError> {
        let rows = courses::list(&self.pool, published_only).await?;
        Ok(rows.into_iter().map(Course::into_canonical).collect())
    }

    async fn save_course(&self, course: &Course) -> Result<bool, StoreError> {
        let course = course.clone().into_canonical();
        Ok(courses::replace(&self.pool, &course).await?)
    }

    async fn delete_course(&self, course_id: &str) -> Result<bool, StoreError> {
        let course_id = ids::normalize(course_id);
        Ok(courses::delete(&self.pool, &course_id).await?)
    }

    async fn insert_chapter(&self, chapter: &Chapter) -> Result<(), StoreError> {
        let chapter = chapter.clone().into_canonical();
        Ok(chapters::create(&self.pool, &chapter).await?)
    }

    async fn find_chapter(&self, chapter_id: &str) -> Result<Option<Chapter>, StoreError> {
        let chapter_id = ids::normalize(chapter_id);
        let chapter = chapters::find_by_id(&self.pool, &chapter_id).await?;
        Ok(chapter.map(Chapter::into_canonical))
    }

    async fn list_chapters(&self, course_refs: &[String]) -> Result<Vec<Chapter>, StoreError> {
        let rows = chapters::list_for_course(&self.pool, course_refs).await?;
        Ok(rows.into_iter().map(Chapter::into_canonical).collect())
    }

    async fn save_chapter(&self, chapter: &Chapter) -> Result<bool, StoreError> {
        let chapter = chapter.clone().into_canonical();
        Ok(chapters::replace(&self.pool, &chapter).await?)
    }

    async fn delete_chapter(&self, chapter_id: &str) -> Result<bool, StoreError> {
        let chapter_id = ids::normalize(chapter_id);
        Ok(chapters::delete(&self.pool, &chapter_id).await?)
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError> {
        let lesson = lesson.clone().into_canonical();
        Ok(lessons::create(&self.pool, &lesson).await?)
    }

    async fn find_lesson(&self, lesson_id: &str) -> Result<Option<Lesson>, StoreError> {
        let lesson_id = ids::normalize(lesson_id);
        let lesson = lessons::find_by_id(&self.pool, &lesson_id).await?;
        Ok(lesson.map(Lesson::into_canonical))
    }

    async fn list_lessons(&self, chapter_id: &str) -> Result<Vec<Lesson>, StoreError> {
        let rows = lessons::list_for_chapter(&self.pool, &ids::representations(chapter_id)).await?;
        Ok(rows.into_iter().map(Lesson::into_canonical).collect())
    }

    async fn save_lesson(&self, lesson: &Lesson) -> Result<bool, StoreError> {
        let lesson = lesson.clone().into_canonical();
        Ok(lessons::replace(&self.pool, &lesson).await?)
    }

    async fn delete_lesson(&self, lesson_id: &str) -> Result<bool, StoreError> {
        let lesson_id = ids::normalize(lesson_id);
        Ok(lessons::delete(&self.pool, &lesson_id).await?)
    }

    async fn delete_lessons_for_chapter(&self, chapter_id: &str) -> Result<u64, StoreError> {
        Ok(lessons::delete_for_chapter(&self.pool, &ids::representations(chapter_id)).await?)
    }
}

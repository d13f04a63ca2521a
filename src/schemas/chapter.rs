use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Chapter;
use crate::schemas::lesson::LessonResponse;
use crate::schemas::PublishFlags;
use crate::services::assembler::ChapterWithLessons;

/// The part of a create request needed to authorize it.
#[derive(Debug, Deserialize)]
pub(crate) struct ChapterParent {
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChapterCreate {
    #[serde(alias = "courseId")]
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    /// Appended after the last chapter when omitted.
    #[serde(default)]
    #[validate(range(min = 0, message = "position must be non-negative"))]
    pub(crate) position: Option<i32>,
    #[serde(flatten)]
    pub(crate) publish: PublishFlags,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChapterUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "position must be non-negative"))]
    pub(crate) position: Option<i32>,
    #[serde(flatten)]
    pub(crate) publish: PublishFlags,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChapterResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) position: i32,
    pub(crate) is_published: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) lessons: Option<Vec<LessonResponse>>,
}

impl ChapterResponse {
    pub(crate) fn from_db(chapter: Chapter) -> Self {
        Self {
            id: chapter.id,
            course_id: chapter.course_id,
            title: chapter.title,
            position: chapter.position,
            is_published: chapter.is_published,
            created_at: format_primitive(chapter.created_at),
            updated_at: format_primitive(chapter.updated_at),
            lessons: None,
        }
    }

    pub(crate) fn with_lessons(entry: ChapterWithLessons) -> Self {
        let lessons = entry.lessons.into_iter().map(LessonResponse::from_db).collect();
        Self { lessons: Some(lessons), ..Self::from_db(entry.chapter) }
    }
}

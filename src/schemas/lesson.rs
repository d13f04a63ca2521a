use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Attachment, Lesson};
use crate::db::types::LessonType;

#[derive(Debug, Clone, Deserialize, Validate)]
pub(crate) struct AttachmentPayload {
    #[validate(length(min = 1, message = "attachment name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "attachment url must not be empty"))]
    pub(crate) url: String,
    #[serde(rename = "type", default)]
    pub(crate) kind: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "attachment size must be non-negative"))]
    pub(crate) size: i64,
}

impl From<AttachmentPayload> for Attachment {
    fn from(payload: AttachmentPayload) -> Self {
        Self { name: payload.name, url: payload.url, kind: payload.kind, size: payload.size }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LessonParent {
    #[serde(alias = "chapterId")]
    pub(crate) chapter_id: String,
}

/// `lesson_type` is kept as text so that an unknown type is reported as a
/// validation error on that field rather than a body parse failure.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LessonCreate {
    #[serde(alias = "chapterId")]
    #[validate(length(min = 1, message = "chapter_id must not be empty"))]
    pub(crate) chapter_id: String,
    /// Optional; when sent it must match the chapter's course.
    #[serde(default, alias = "courseId")]
    pub(crate) course_id: Option<String>,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) content: Option<String>,
    #[serde(default, alias = "videoUrl")]
    pub(crate) video_url: Option<String>,
    #[serde(alias = "lessonType")]
    pub(crate) lesson_type: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "duration must be non-negative"))]
    pub(crate) duration: i32,
    #[serde(default, alias = "isFree")]
    pub(crate) is_free: bool,
    #[serde(default)]
    #[validate(range(min = 0, message = "position must be non-negative"))]
    pub(crate) position: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) attachments: Vec<AttachmentPayload>,
}

/// Partial update. Sending an empty string for `content` or `video_url` clears it.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LessonUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) content: Option<String>,
    #[serde(default, alias = "videoUrl")]
    pub(crate) video_url: Option<String>,
    #[serde(default, alias = "lessonType")]
    pub(crate) lesson_type: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "duration must be non-negative"))]
    pub(crate) duration: Option<i32>,
    #[serde(default, alias = "isFree")]
    pub(crate) is_free: Option<bool>,
    #[serde(default)]
    #[validate(range(min = 0, message = "position must be non-negative"))]
    pub(crate) position: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) attachments: Option<Vec<AttachmentPayload>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonResponse {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    /// Empty for video lessons.
    pub(crate) content: String,
    /// Empty for text lessons.
    pub(crate) video_url: String,
    pub(crate) lesson_type: LessonType,
    pub(crate) duration: i32,
    pub(crate) is_free: bool,
    pub(crate) position: i32,
    pub(crate) attachments: Vec<Attachment>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl LessonResponse {
    pub(crate) fn from_db(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            chapter_id: lesson.chapter_id,
            course_id: lesson.course_id,
            title: lesson.title,
            description: lesson.description,
            content: lesson.content.unwrap_or_default(),
            video_url: lesson.video_url.unwrap_or_default(),
            lesson_type: lesson.lesson_type,
            duration: lesson.duration,
            is_free: lesson.is_free,
            position: lesson.position,
            attachments: lesson.attachments.0,
            created_at: format_primitive(lesson.created_at),
            updated_at: format_primitive(lesson.updated_at),
        }
    }
}

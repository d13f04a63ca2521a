use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::LessonType;
use crate::services::ids;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) owner_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) category: Option<String>,
    /// Informational only; purchases are handled elsewhere.
    pub(crate) price: f64,
    pub(crate) enrolled_users: Json<Vec<String>>,
    pub(crate) is_published: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct Chapter {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) position: i32,
    pub(crate) is_published: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct Lesson {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) content: Option<String>,
    pub(crate) video_url: Option<String>,
    pub(crate) lesson_type: LessonType,
    pub(crate) duration: i32,
    pub(crate) is_free: bool,
    pub(crate) position: i32,
    pub(crate) attachments: Json<Vec<Attachment>>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Attachment {
    pub(crate) name: String,
    pub(crate) url: String,
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) size: i64,
}

// Rows written by older clients may carry ObjectId-shaped references; every
// row leaving the store goes through these so callers only see canonical ids.

impl Course {
    pub(crate) fn into_canonical(mut self) -> Self {
        self.id = ids::normalize(&self.id);
        self.owner_id = ids::normalize(&self.owner_id);
        self.enrolled_users = Json(ids::normalize_list(self.enrolled_users.0.iter()));
        self
    }

    pub(crate) fn enrolled_user_ids(&self) -> &[String] {
        &self.enrolled_users.0
    }
}

impl Chapter {
    pub(crate) fn into_canonical(mut self) -> Self {
        self.id = ids::normalize(&self.id);
        self.course_id = ids::normalize(&self.course_id);
        self
    }
}

impl Lesson {
    pub(crate) fn into_canonical(mut self) -> Self {
        self.id = ids::normalize(&self.id);
        self.chapter_id = ids::normalize(&self.chapter_id);
        self.course_id = ids::normalize(&self.course_id);
        self
    }
}

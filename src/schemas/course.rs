use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Course;
use crate::schemas::chapter::ChapterResponse;
use crate::schemas::PublishFlags;
use crate::services::assembler::CourseWithContent;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "category must be at most 100 characters"))]
    pub(crate) category: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "price must be non-negative"))]
    pub(crate) price: f64,
}

/// Partial update. `enrolled_users`, when present, replaces the whole list.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "category must be at most 100 characters"))]
    pub(crate) category: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "price must be non-negative"))]
    pub(crate) price: Option<f64>,
    #[serde(default, alias = "enrolledUsers")]
    pub(crate) enrolled_users: Option<Vec<String>>,
    #[serde(flatten)]
    pub(crate) publish: PublishFlags,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentUpdate {
    #[serde(alias = "enrolledUsers")]
    pub(crate) enrolled_users: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) owner_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) price: f64,
    pub(crate) is_published: bool,
    /// Mirror of `is_published` for clients that still read the old name.
    pub(crate) published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) enrolled_users: Option<Vec<String>>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) chapters: Option<Vec<ChapterResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) content_complete: Option<bool>,
}

impl CourseResponse {
    /// Enrollment lists are only shown to callers who may change them.
    pub(crate) fn from_db(course: Course, show_enrollment: bool) -> Self {
        Self {
            enrolled_users: show_enrollment.then(|| course.enrolled_users.0.clone()),
            id: course.id,
            owner_id: course.owner_id,
            title: course.title,
            description: course.description,
            category: course.category,
            price: course.price,
            is_published: course.is_published,
            published: course.is_published,
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
            chapters: None,
            content_complete: None,
        }
    }

    pub(crate) fn with_content(assembled: CourseWithContent, show_enrollment: bool) -> Self {
        let chapters = assembled.chapters.into_iter().map(ChapterResponse::with_lessons).collect();
        Self {
            chapters: Some(chapters),
            content_complete: Some(assembled.complete),
            ..Self::from_db(assembled.course, show_enrollment)
        }
    }
}

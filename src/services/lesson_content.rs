use thiserror::Error;

use crate::db::types::LessonType;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum LessonContentError {
    #[error("video lessons require a video_url")]
    MissingVideoUrl,
    #[error("video_url must be an http or https URL")]
    InvalidVideoUrl,
    #[error("video lessons must not carry text content")]
    UnexpectedContent,
    #[error("text lessons require content")]
    MissingContent,
    #[error("text lessons must not carry a video_url")]
    UnexpectedVideoUrl,
}

impl LessonContentError {
    pub(crate) fn field(&self) -> &'static str {
        match self {
            Self::MissingVideoUrl | Self::InvalidVideoUrl | Self::UnexpectedVideoUrl => "video_url",
            Self::UnexpectedContent | Self::MissingContent => "content",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LessonBody {
    pub(crate) content: Option<String>,
    pub(crate) video_url: Option<String>,
}

/// Enforces that exactly one of `content` and `video_url` is meaningful for the
/// lesson type. Blank strings count as absent and the inactive side is stored
/// as `None`.
pub(crate) fn normalize_body(
    lesson_type: LessonType,
    content: Option<&str>,
    video_url: Option<&str>,
) -> Result<LessonBody, LessonContentError> {
    let content = non_blank(content);
    let video_url = non_blank(video_url);

    match lesson_type {
        LessonType::Video => {
            let url = video_url.ok_or(LessonContentError::MissingVideoUrl)?;
            if !is_http_url(&url) {
                return Err(LessonContentError::InvalidVideoUrl);
            }
            if content.is_some() {
                return Err(LessonContentError::UnexpectedContent);
            }
            Ok(LessonBody { content: None, video_url: Some(url) })
        }
        LessonType::Text => {
            let content = content.ok_or(LessonContentError::MissingContent)?;
            if video_url.is_some() {
                return Err(LessonContentError::UnexpectedVideoUrl);
            }
            Ok(LessonBody { content: Some(content), video_url: None })
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

fn is_http_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()))
}

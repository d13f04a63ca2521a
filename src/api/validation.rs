use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::api::errors::ApiError;
use crate::db::types::LessonType;

/// Mutating handlers take the raw body and decode it only once the caller is
/// authorized, so a caller without rights never gets a body error back.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

/// Trims `value`; whitespace-only input is rejected against `field`.
pub(crate) fn non_blank(field: &'static str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(field, format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn parse_lesson_type(raw: &str) -> Result<LessonType, ApiError> {
    raw.parse().map_err(|message: String| ApiError::validation("lesson_type", message))
}

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::error::Category;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::core::metrics;
use crate::schemas::ConflictingPublishFlags;
use crate::services::identity::IdentityError;
use crate::services::lesson_content::LessonContentError;
use crate::services::ownership::AccessError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    Validation { field: String, message: String },
    NotFound(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    pub(crate) fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }
}

fn json_error(status: StatusCode, detail: String, field: Option<String>) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail, field })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let mut response =
                    json_error(StatusCode::UNAUTHORIZED, message.to_string(), None);
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                json_error(StatusCode::FORBIDDEN, message.to_string(), None)
            }
            ApiError::Validation { field, message } => {
                json_error(StatusCode::BAD_REQUEST, message, Some(field))
            }
            ApiError::NotFound(message) => json_error(StatusCode::NOT_FOUND, message, None),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, message, None)
            }
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => {
                metrics::record_access_denied("unauthenticated");
                ApiError::Unauthorized("Authentication required")
            }
            // The reason is only recorded, never returned.
            AccessError::Forbidden(reason) => {
                metrics::record_access_denied(reason);
                ApiError::Forbidden("Forbidden")
            }
            AccessError::NotFound(what) => ApiError::not_found(what),
            AccessError::Store(err) => ApiError::internal(err, "Content store failure"),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        tracing::debug!(error = %err, "rejecting session token");
        metrics::record_access_denied("invalid_token");
        ApiError::Unauthorized("Invalid authentication credentials")
    }
}

impl From<LessonContentError> for ApiError {
    fn from(err: LessonContentError) -> Self {
        ApiError::validation(err.field(), err.to_string())
    }
}

impl From<ConflictingPublishFlags> for ApiError {
    fn from(err: ConflictingPublishFlags) -> Self {
        ApiError::validation("is_published", err.to_string())
    }
}

// serde appends the position of the failure; callers get the message and, for a
// missing field, its name.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        let message = match message.rsplit_once(" at line ") {
            Some((head, _)) => head.to_string(),
            None => message,
        };
        let field = match err.classify() {
            Category::Data => missing_field(&message),
            _ => None,
        };
        ApiError::validation(field.unwrap_or_else(|| "body".to_string()), message)
    }
}

fn missing_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split_once('`').map(|(name, _)| name.to_string())
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let field = first_invalid_field(&errors).unwrap_or_else(|| "body".to_string());
        ApiError::validation(field, errors.to_string())
    }
}

// Nested errors are reported as `parent[index].child`.
fn first_invalid_field(errors: &ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    let (name, kind) = fields.into_iter().next()?;

    let nested = match kind {
        ValidationErrorsKind::Field(_) => None,
        ValidationErrorsKind::Struct(inner) => {
            first_invalid_field(inner).map(|child| format!("{name}.{child}"))
        }
        ValidationErrorsKind::List(items) => items.iter().next().and_then(|(index, inner)| {
            first_invalid_field(inner).map(|child| format!("{name}[{index}].{child}"))
        }),
    };
    Some(nested.unwrap_or_else(|| name.to_string()))
}

use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts, HeaderMap};

use crate::api::errors::ApiError;
use crate::core::{config::Settings, state::AppState};
use crate::db::models::Course;
use crate::services::identity::{self, Identity};
use crate::services::visibility::{self, Visibility};

/// Caller for read paths. A missing, expired or malformed token degrades to
/// [`Identity::Anonymous`].
pub(crate) struct OptionalIdentity(pub(crate) Identity);

/// Caller for write paths. Anything short of a valid session is a 401.
pub(crate) struct CurrentIdentity(pub(crate) Identity);

#[async_trait]
impl FromRequestParts<AppState> for OptionalIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = session_token(&parts.headers, app_state.settings());
        let identity = match identity::resolve(token.as_deref(), app_state.settings()) {
            Ok(identity) => identity,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unusable session token on read path");
                Identity::Anonymous
            }
        };

        Ok(OptionalIdentity(identity))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = session_token(&parts.headers, app_state.settings());
        let identity = identity::resolve(token.as_deref(), app_state.settings())?;
        if !identity.is_authenticated() {
            return Err(ApiError::Unauthorized("Authentication required"));
        }

        Ok(CurrentIdentity(identity))
    }
}

/// Loads a course for a read path. Courses the caller may not see are reported
/// exactly like missing ones.
pub(crate) async fn load_visible_course(
    state: &AppState,
    identity: &Identity,
    course_id: &str,
) -> Result<(Course, Visibility), ApiError> {
    let course = state
        .store()
        .find_course(course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    let visibility = visibility::resolve(identity, &course);
    if !visibility.show_course {
        tracing::debug!(
            course_id = %course.id,
            subject_id = identity.label(),
            "course hidden from caller"
        );
        return Err(ApiError::not_found("Course"));
    }

    Ok((course, visibility))
}

/// The bearer header wins over the session cookie when both are sent.
pub(crate) fn session_token(headers: &HeaderMap, settings: &Settings) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => parse_cookie(headers, &settings.session().cookie_name),
    }
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    use crate::test_support;

    #[tokio::test]
    async fn cookie_token_is_found_among_other_cookies() {
        let settings = test_support::test_settings().await;
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=abc.def; x=1"));

        assert_eq!(session_token(&headers, &settings).as_deref(), Some("abc.def"));
    }

    #[tokio::test]
    async fn bearer_header_takes_precedence() {
        let settings = test_support::test_settings().await;
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        assert_eq!(session_token(&headers, &settings).as_deref(), Some("from-header"));
    }

    #[tokio::test]
    async fn empty_cookie_value_is_no_token() {
        let settings = test_support::test_settings().await;
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token=; other=1"));

        assert_eq!(session_token(&headers, &settings), None);
    }
}

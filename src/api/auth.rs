use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentIdentity, OptionalIdentity};
use crate::core::security;
use crate::core::state::AppState;
use crate::schemas::auth::{LogoutResponse, MeResponse, SessionResponse};

// Credentials live in the account service. This service reads its sessions and
// can extend one that is still valid.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

async fn me(OptionalIdentity(identity): OptionalIdentity) -> Json<MeResponse> {
    Json(MeResponse::from_identity(&identity))
}

async fn refresh(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(subject_id), Some(role)) = (identity.subject_id(), identity.role()) else {
        return Err(ApiError::Unauthorized("Authentication required"));
    };
    let token = security::create_access_token(subject_id, role.as_str(), state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to issue session token"))?;
    let cookie = security::session_cookie(&token, state.settings());

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            identity: MeResponse::from_identity(&identity),
        }),
    ))
}

async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = security::cleared_session_cookie(state.settings());
    (
        [(header::SET_COOKIE, cookie)],
        Json(LogoutResponse { message: "Logged out".to_string() }),
    )
}

use serde::Serialize;

use crate::services::identity::{Identity, UserRole};

#[derive(Debug, Serialize)]
pub(crate) struct MeResponse {
    pub(crate) authenticated: bool,
    pub(crate) subject_id: Option<String>,
    pub(crate) role: Option<UserRole>,
}

impl MeResponse {
    pub(crate) fn from_identity(identity: &Identity) -> Self {
        Self {
            authenticated: identity.is_authenticated(),
            subject_id: identity.subject_id().map(str::to_string),
            role: identity.role(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LogoutResponse {
    pub(crate) message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) identity: MeResponse,
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::Settings;
use crate::core::security::{self, Claims};
use crate::db::models::Course;
use crate::services::ids;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

impl FromStr for UserRole {
    type Err = IdentityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(IdentityError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub(crate) enum IdentityError {
    #[error("session token is invalid or expired")]
    InvalidToken,
    #[error("session token carries unknown role {0:?}")]
    UnknownRole(String),
    #[error("session token has an empty subject")]
    MissingSubject,
}

/// Who is making the request. Derived from the session token on every request
/// and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Identity {
    Anonymous,
    Student { subject_id: String },
    Teacher { subject_id: String },
    Admin { subject_id: String },
}

impl Identity {
    pub(crate) fn from_claims(claims: &Claims) -> Result<Self, IdentityError> {
        let role: UserRole = claims.role.parse()?;
        let subject_id = ids::normalize(&claims.sub);
        if subject_id.is_empty() {
            return Err(IdentityError::MissingSubject);
        }

        Ok(match role {
            UserRole::Admin => Self::Admin { subject_id },
            UserRole::Teacher => Self::Teacher { subject_id },
            UserRole::Student => Self::Student { subject_id },
        })
    }

    pub(crate) fn subject_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Student { subject_id }
            | Self::Teacher { subject_id }
            | Self::Admin { subject_id } => Some(subject_id),
        }
    }

    pub(crate) fn role(&self) -> Option<UserRole> {
        match self {
            Self::Anonymous => None,
            Self::Student { .. } => Some(UserRole::Student),
            Self::Teacher { .. } => Some(UserRole::Teacher),
            Self::Admin { .. } => Some(UserRole::Admin),
        }
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    /// Teachers and admins may create courses; they own what they create.
    pub(crate) fn can_author(&self) -> bool {
        matches!(self, Self::Teacher { .. } | Self::Admin { .. })
    }

    /// The single mutation capability: admins may change any course, teachers
    /// only the courses they own, everyone else nothing.
    pub(crate) fn can_mutate(&self, course: &Course) -> bool {
        match self {
            Self::Admin { .. } => true,
            Self::Teacher { subject_id } => ids::same_id(&course.owner_id, subject_id),
            Self::Student { .. } | Self::Anonymous => false,
        }
    }

    pub(crate) fn label(&self) -> &str {
        self.subject_id().unwrap_or("anonymous")
    }
}

/// Resolves the caller from an optional session token. A missing token is an
/// anonymous caller, not an error; a present but unusable token is an error
/// that read paths may downgrade to anonymous.
pub(crate) fn resolve(token: Option<&str>, settings: &Settings) -> Result<Identity, IdentityError> {
    let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
        return Ok(Identity::Anonymous);
    };

    let claims = security::verify_token(token, settings).map_err(|_| IdentityError::InvalidToken)?;
    Identity::from_claims(&claims)
}

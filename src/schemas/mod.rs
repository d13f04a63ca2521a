use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) mod auth;
pub(crate) mod chapter;
pub(crate) mod course;
pub(crate) mod lesson;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("published and is_published disagree")]
pub(crate) struct ConflictingPublishFlags;

/// Older clients send `published`, newer ones `is_published`; both name the one
/// stored flag.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub(crate) struct PublishFlags {
    #[serde(default)]
    pub(crate) published: Option<bool>,
    #[serde(default, alias = "isPublished")]
    pub(crate) is_published: Option<bool>,
}

impl PublishFlags {
    pub(crate) fn resolve(self) -> Result<Option<bool>, ConflictingPublishFlags> {
        match (self.published, self.is_published) {
            (Some(left), Some(right)) if left != right => Err(ConflictingPublishFlags),
            (left, right) => Ok(left.or(right)),
        }
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "lessontype", rename_all = "lowercase")]
pub(crate) enum LessonType {
    Video,
    Text,
}

impl LessonType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "text" => Ok(Self::Text),
            other => Err(format!("lesson_type must be \"video\" or \"text\", got {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_type_parses_case_insensitively() {
        assert_eq!(" Video ".parse::<LessonType>(), Ok(LessonType::Video));
        assert_eq!("TEXT".parse::<LessonType>(), Ok(LessonType::Text));
        assert!("audio".parse::<LessonType>().is_err());
    }
}

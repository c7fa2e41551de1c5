use serde::{Deserialize, Serialize};

use crate::locales::Language;

pub const DEFAULT_NICKNAME: &str = "Guest";

/// Per-viewer settings kept between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub nickname: String,
    pub language: Language,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            nickname: DEFAULT_NICKNAME.to_string(),
            language: Language::default(),
        }
    }
}

impl Preferences {
    pub fn with_language(language: Language) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    /// An empty or blank nickname falls back to the default.
    pub fn set_nickname(&mut self, nickname: &str) {
        let trimmed = nickname.trim();
        self.nickname = if trimmed.is_empty() {
            DEFAULT_NICKNAME.to_string()
        } else {
            trimmed.to_string()
        };
    }
}

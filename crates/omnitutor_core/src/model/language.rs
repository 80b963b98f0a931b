//! Target languages supported by lessons and pronunciation.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Language a card's term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    German,
    Spanish,
    English,
    French,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::German,
        Language::Spanish,
        Language::English,
        Language::French,
    ];

    /// ISO 639-1 code, also used by speech synthesis.
    pub fn code(self) -> &'static str {
        match self {
            Self::German => "de",
            Self::Spanish => "es",
            Self::English => "en",
            Self::French => "fr",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::German => "German",
            Self::Spanish => "Spanish",
            Self::English => "English",
            Self::French => "French",
        }
    }

    /// Parses a display name or ISO code, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == normalized || lang.name().eq_ignore_ascii_case(&normalized))
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

use std::{fmt, sync::LazyLock};

use compact_str::CompactString;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ProofreadPage writes the marker as the first thing in the header of a `Page:` revision,
// e.g. `<noinclude><pagequality level="3" user="Jane" />...</noinclude>`
static PAGEQUALITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<pagequality level="(\d)" user="(.*?)" ?/>"#)
        .expect("pagequality regex is statically valid")
});

/// Proofreading state of a `Page:` as recorded by the ProofreadPage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum QualityLevel {
    WithoutText = 0,
    NotProofread = 1,
    Problematic = 2,
    Proofread = 3,
    Validated = 4,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 5] = [
        QualityLevel::WithoutText,
        QualityLevel::NotProofread,
        QualityLevel::Problematic,
        QualityLevel::Proofread,
        QualityLevel::Validated,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// `true` for levels 3 and 4.
    pub fn is_proofread(self) -> bool {
        self >= QualityLevel::Proofread
    }
}

impl TryFrom<u8> for QualityLevel {
    type Error = QualityMarkerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(QualityLevel::WithoutText),
            1 => Ok(QualityLevel::NotProofread),
            2 => Ok(QualityLevel::Problematic),
            3 => Ok(QualityLevel::Proofread),
            4 => Ok(QualityLevel::Validated),
            other => Err(QualityMarkerError::InvalidLevel(other)),
        }
    }
}

impl From<QualityLevel> for u8 {
    fn from(level: QualityLevel) -> Self {
        level.code()
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualityMarkerError {
    #[error("content does not contain a <pagequality> marker")]
    Missing,
    #[error("quality level {0} is outside of 0..=4")]
    InvalidLevel(u8),
}

/// The `<pagequality level="N" user="..." />` annotation of one revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualityMarker {
    pub level: QualityLevel,
    /// User the wiki credits with setting `level`.
    pub user: CompactString,
}

impl QualityMarker {
    /// Extract the first quality marker found in `content`.
    pub fn extract(content: &str) -> Result<Self, QualityMarkerError> {
        let captures = PAGEQUALITY_REGEX
            .captures(content)
            .ok_or(QualityMarkerError::Missing)?;

        let (_, [level, user]) = captures.extract();
        // the regex only matches a single ASCII digit
        let level = level.as_bytes()[0] - b'0';

        Ok(QualityMarker {
            level: QualityLevel::try_from(level)?,
            user: CompactString::from(user),
        })
    }
}

use chrono::{DateTime, Utc};
use compact_str::CompactString;

use crate::quality::{QualityMarker, QualityMarkerError};

/// One historical edit of a wiki page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision {
    pub revision_id: u64,
    pub timestamp: DateTime<Utc>,
    // user who saved the revision, not necessarily the one named in the quality marker
    pub user: CompactString,
    /// Byte length of `content` as reported by the wiki.
    pub size: usize,
    /// Raw wikitext of the revision.
    pub content: String,
}

impl Revision {
    pub fn quality_marker(&self) -> Result<QualityMarker, QualityMarkerError> {
        QualityMarker::extract(&self.content)
    }
}

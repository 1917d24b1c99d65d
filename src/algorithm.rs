use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::{
    quality::{QualityLevel, QualityMarkerError},
    revision::Revision,
};

/// Who raised the quality of a page, and when.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEvent {
    pub user: CompactString,
    pub timestamp: DateTime<Utc>,
    pub revision_id: u64,
}

/// Tracked proofreading tier of a page while its history is replayed.
///
/// The events live inside the variants, so a validation can never be recorded without the
/// proofreading it builds on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QualityState {
    /// No revision seen yet. Distinct from a revision at level 0.
    #[default]
    Unset,
    /// Last revision was at level 0, 1 or 2.
    NotProofread,
    Proofread {
        proofread: StatusEvent,
    },
    Validated {
        proofread: StatusEvent,
        validate: StatusEvent,
    },
}

impl QualityState {
    /// Apply the revision at `level`, attributed to `event`, to the current state.
    pub fn advance(self, level: QualityLevel, event: StatusEvent) -> Self {
        use QualityLevel as L;
        use QualityState as S;

        match (self, level) {
            // falling below 3 clears proofread and validate alike
            (_, L::WithoutText | L::NotProofread | L::Problematic) => S::NotProofread,

            (S::Unset | S::NotProofread, L::Proofread) => S::Proofread { proofread: event },
            (state @ S::Proofread { .. }, L::Proofread) => state,
            // de-validated but still proofread: the original proofreader keeps the credit
            (S::Validated { proofread, .. }, L::Proofread) => S::Proofread { proofread },

            (S::Proofread { proofread }, L::Validated) => S::Validated {
                proofread,
                validate: event,
            },
            (state @ S::Validated { .. }, L::Validated) => state,
            // history starts at 4 or skips level 3: this revision is credited for both
            (S::Unset | S::NotProofread, L::Validated) => S::Validated {
                proofread: event.clone(),
                validate: event,
            },
        }
    }

    pub fn proofread(&self) -> Option<&StatusEvent> {
        match self {
            QualityState::Proofread { proofread } | QualityState::Validated { proofread, .. } => {
                Some(proofread)
            }
            QualityState::Unset | QualityState::NotProofread => None,
        }
    }

    pub fn validate(&self) -> Option<&StatusEvent> {
        match self {
            QualityState::Validated { validate, .. } => Some(validate),
            _ => None,
        }
    }

    fn into_events(self) -> (Option<StatusEvent>, Option<StatusEvent>) {
        match self {
            QualityState::Unset | QualityState::NotProofread => (None, None),
            QualityState::Proofread { proofread } => (Some(proofread), None),
            QualityState::Validated {
                proofread,
                validate,
            } => (Some(proofread), Some(validate)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("page has no revisions")]
    EmptyHistory,
    #[error("revision {revision_id} has no usable quality marker")]
    MalformedRevision {
        revision_id: u64,
        #[source]
        source: QualityMarkerError,
    },
}

/// Proofreading status of a page, derived from its full revision history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStatus {
    /// Quality level of the latest revision.
    pub code: QualityLevel,
    /// Size in bytes of the latest revision.
    pub size: usize,
    pub proofread: Option<StatusEvent>,
    pub validate: Option<StatusEvent>,
}

impl PageStatus {
    /// Replay `revisions` (oldest first) and report the proofreading status they leave the page in.
    ///
    /// The order of `revisions` is not checked.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::EmptyHistory`] if `revisions` is empty
    /// - [`AnalysisError::MalformedRevision`] for the first revision without a valid `<pagequality>` marker
    pub fn analyse(revisions: &[Revision]) -> Result<Self, AnalysisError> {
        let mut state = QualityState::Unset;
        let mut latest = None;

        for revision in revisions {
            let marker =
                revision
                    .quality_marker()
                    .map_err(|source| AnalysisError::MalformedRevision {
                        revision_id: revision.revision_id,
                        source,
                    })?;

            let event = StatusEvent {
                user: marker.user,
                timestamp: revision.timestamp,
                revision_id: revision.revision_id,
            };
            state = state.advance(marker.level, event);
            latest = Some((marker.level, revision.size));
        }

        let (code, size) = latest.ok_or(AnalysisError::EmptyHistory)?;
        Ok(Self::from_state(code, size, state))
    }

    fn from_state(code: QualityLevel, size: usize, state: QualityState) -> Self {
        let (proofread, validate) = state.into_events();

        PageStatus {
            code,
            size,
            proofread,
            validate,
        }
    }
}

use chrono::{DateTime, Utc};

use crate::{quality::QualityLevel, revision::Revision};

pub mod prelude {
    pub(crate) use super::proptest as proptest_support;
    pub(crate) use super::revision_with_marker;
    pub(crate) use proptest::prelude::*;
}

pub fn timestamp_of(revision_id: u64) -> DateTime<Utc> {
    // one edit per minute, starting 2020-09-13
    DateTime::from_timestamp(1_600_000_000 + revision_id as i64 * 60, 0).unwrap()
}

pub fn revision_with_marker(revision_id: u64, level: QualityLevel, user: &str) -> Revision {
    let content = proptest::marker_content(level, user);

    Revision {
        revision_id,
        timestamp: timestamp_of(revision_id),
        user: user.into(),
        size: content.len(),
        content,
    }
}

/// A revision at `level` whose marker credits a user named after the revision.
pub fn revision_at(revision_id: u64, level: u8) -> Revision {
    let level = QualityLevel::try_from(level).unwrap();
    revision_with_marker(revision_id, level, &format!("User{revision_id}"))
}

pub fn history_from_levels(levels: &[u8]) -> Vec<Revision> {
    levels
        .iter()
        .enumerate()
        .map(|(i, &level)| revision_at(i as u64 + 1, level))
        .collect()
}

pub mod proptest {
    use std::ops::Range;

    use proptest::prelude::*;

    use super::history_from_levels;
    use crate::{quality::QualityLevel, revision::Revision};

    pub fn marker_content(level: QualityLevel, user: &str) -> String {
        format!(
            "<noinclude><pagequality level=\"{}\" user=\"{user}\" /></noinclude>Lorem ipsum dolor sit amet",
            level.code()
        )
    }

    pub fn quality_level() -> impl Strategy<Value = QualityLevel> {
        proptest::sample::select(QualityLevel::ALL.to_vec())
    }

    pub fn revision_history(length: Range<usize>) -> impl Strategy<Value = Vec<Revision>> {
        proptest::collection::vec(0u8..=4, length).prop_map(|levels| history_from_levels(&levels))
    }

    /// Like [`revision_history`], but level 4 is only ever reached from level 3 or 4.
    pub fn stepwise_revision_history(length: Range<usize>) -> impl Strategy<Value = Vec<Revision>> {
        proptest::collection::vec(0u8..=4, length).prop_map(|mut levels| {
            for i in 0..levels.len() {
                let previous = if i == 0 { None } else { Some(levels[i - 1]) };
                if levels[i] == 4 && !matches!(previous, Some(3 | 4)) {
                    levels[i] = 3;
                }
            }
            history_from_levels(&levels)
        })
    }

    /// A history that starts below level 3 and then passes through one run of revisions per
    /// entry of `phases`. A phase below 3 produces arbitrary levels in `0..3`.
    pub fn rising_history(phases: &[u8]) -> BoxedStrategy<Vec<Revision>> {
        let mut levels = proptest::collection::vec(0u8..3, 0..3).boxed();

        for &phase in phases {
            let run = if phase < 3 {
                proptest::collection::vec(0u8..3, 1..4).boxed()
            } else {
                proptest::collection::vec(Just(phase), 1..4).boxed()
            };
            levels = (levels, run)
                .prop_map(|(mut levels, run)| {
                    levels.extend(run);
                    levels
                })
                .boxed();
        }

        levels
            .prop_map(|levels| history_from_levels(&levels))
            .boxed()
    }
}

use std::{
    collections::{HashMap, HashSet},
    future::Future,
};

use compact_str::CompactString;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{info, instrument, warn};

use crate::{
    algorithm::{AnalysisError, PageStatus},
    client::FetchError,
    revision::Revision,
};

/// Number of revision fetches kept in flight by default.
pub const DEFAULT_CONCURRENCY: usize = 40;

/// Anything that can deliver the revision history of a page, oldest revision first.
pub trait RevisionSource: Sync {
    fn fetch_revisions(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Vec<Revision>, FetchError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("failed to fetch revisions")]
    Fetch(#[from] FetchError),
    #[error("failed to analyse revisions")]
    Analysis(#[from] AnalysisError),
}

/// A batch is all-or-nothing: this names the page that aborted it.
#[derive(Debug, thiserror::Error)]
#[error("batch aborted by page `{title}`")]
pub struct BatchError {
    pub title: CompactString,
    #[source]
    pub source: PageError,
}

/// Fetch the history of `title` and analyse it.
pub async fn analyse_page<S: RevisionSource>(
    source: &S,
    title: &str,
) -> Result<PageStatus, PageError> {
    let revisions = source.fetch_revisions(title).await?;
    Ok(PageStatus::analyse(&revisions)?)
}

/// Analyse every page in `titles`, keeping at most `limit` fetches in flight.
///
/// Pages complete in no particular order. The first page that fails aborts the whole batch:
/// fetches still in flight are dropped and no partial result is returned. Duplicate titles are
/// fetched once.
#[instrument(skip(source, titles))]
pub async fn analyse_batch<S, I, T>(
    source: &S,
    titles: I,
    limit: usize,
) -> Result<HashMap<String, PageStatus>, BatchError>
where
    S: RevisionSource,
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut seen = HashSet::new();
    let titles: Vec<String> = titles
        .into_iter()
        .map(Into::<String>::into)
        .filter(|title| seen.insert(title.clone()))
        .collect();
    let limit = limit.max(1);

    info!(pages = titles.len(), limit, "analysing batch");

    let statuses = stream::iter(titles)
        .map(|title| async move {
            match analyse_page(source, &title).await {
                Ok(status) => Ok((title, status)),
                Err(error) => Err(BatchError {
                    title: title.into(),
                    source: error,
                }),
            }
        })
        .buffer_unordered(limit)
        .try_collect::<HashMap<_, _>>()
        .await;

    match &statuses {
        Ok(statuses) => info!(pages = statuses.len(), "batch complete"),
        Err(err) => warn!(title = %err.title, error = %err.source, "batch aborted"),
    }

    statuses
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration,
    };

    use super::*;
    use crate::{quality::QualityLevel, test_support::history_from_levels};

    /// Serves fixed histories and records how many fetches overlap.
    #[derive(Default)]
    struct FakeWiki {
        pages: HashMap<&'static str, Vec<u8>>,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeWiki {
        fn with_pages(pages: impl IntoIterator<Item = (&'static str, Vec<u8>)>) -> Self {
            FakeWiki {
                pages: pages.into_iter().collect(),
                ..Default::default()
            }
        }
    }

    impl RevisionSource for FakeWiki {
        fn fetch_revisions(
            &self,
            title: &str,
        ) -> impl Future<Output = Result<Vec<Revision>, FetchError>> + Send {
            let title = title.to_string();
            async move {
                let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(current, Ordering::SeqCst);
                self.fetched.lock().unwrap().push(title.clone());

                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }

                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                self.pages
                    .get(title.as_str())
                    .map(|levels| history_from_levels(levels))
                    .ok_or(FetchError::MissingPage(title.into()))
            }
        }
    }

    #[tokio::test]
    async fn batch_analyses_every_page() {
        let wiki = FakeWiki::with_pages([
            ("Page:A.djvu/1", vec![1, 3]),
            ("Page:A.djvu/2", vec![1, 3, 4]),
            ("Page:A.djvu/3", vec![0]),
        ]);

        let statuses = analyse_batch(&wiki, ["Page:A.djvu/1", "Page:A.djvu/2", "Page:A.djvu/3"], 2)
            .await
            .unwrap();

        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses["Page:A.djvu/1"].code, QualityLevel::Proofread);
        assert_eq!(statuses["Page:A.djvu/2"].validate.as_ref().unwrap().revision_id, 3);
        assert_eq!(statuses["Page:A.djvu/3"].proofread, None);
    }

    #[tokio::test]
    async fn one_failing_fetch_fails_the_whole_batch() {
        let wiki = FakeWiki::with_pages([("Good 1", vec![1, 3]), ("Good 2", vec![3, 4])]);

        let result = analyse_batch(&wiki, ["Good 1", "Gone", "Good 2"], DEFAULT_CONCURRENCY).await;

        // no mapping at all, not even for the pages that succeeded
        let err = result.unwrap_err();
        assert_eq!(err.title, "Gone");
        assert!(matches!(
            err.source,
            PageError::Fetch(FetchError::MissingPage(ref title)) if title.as_str() == "Gone"
        ));
    }

    #[tokio::test]
    async fn malformed_history_fails_the_whole_batch() {
        let wiki = FakeWiki::with_pages([("Good", vec![1, 3]), ("Empty", vec![])]);

        let err = analyse_batch(&wiki, ["Good", "Empty"], 4).await.unwrap_err();

        assert_eq!(err.title, "Empty");
        assert!(matches!(
            err.source,
            PageError::Analysis(AnalysisError::EmptyHistory)
        ));
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let titles: Vec<String> = (1..=12).map(|i| format!("Page:B.pdf/{i}")).collect();
        let mut wiki = FakeWiki {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        for title in &titles {
            wiki.pages.insert(title.clone().leak(), vec![1, 3]);
        }

        let statuses = analyse_batch(&wiki, titles.clone(), 3).await.unwrap();

        assert_eq!(statuses.len(), 12);
        assert!(wiki.max_in_flight.load(Ordering::SeqCst) <= 3);
        assert!(wiki.max_in_flight.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn duplicate_titles_are_fetched_once() {
        let wiki = FakeWiki::with_pages([("Same", vec![3])]);

        let statuses = analyse_batch(&wiki, ["Same", "Same", "Same"], 2).await.unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(wiki.fetched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_limit_still_makes_progress() {
        let wiki = FakeWiki::with_pages([("One", vec![1]), ("Two", vec![4])]);

        let statuses = analyse_batch(&wiki, ["One", "Two"], 0).await.unwrap();

        assert_eq!(statuses.len(), 2);
        assert_eq!(wiki.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_batch() {
        let wiki = FakeWiki::default();
        let statuses = analyse_batch(&wiki, Vec::<String>::new(), 5).await.unwrap();
        assert!(statuses.is_empty());
    }
}

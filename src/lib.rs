// SPDX-License-Identifier: MIT
//! # wikisource
//!
//! A client library for the [Wikisource](https://wikisource.org) wikis that answers the questions
//! a proofreading community keeps asking: how many pages does a scan have, which pages are
//! proofread or validated, and who did the work.
//!
//! ## Overview
//!
//! Every `Page:` on a Wikisource carries a quality level that the ProofreadPage extension stores
//! in the wikitext of each revision as a `<pagequality level="N" user="..." />` marker:
//!
//! | Level | Meaning        |
//! |-------|----------------|
//! | 0     | without text   |
//! | 1     | not proofread  |
//! | 2     | problematic    |
//! | 3     | proofread      |
//! | 4     | validated      |
//!
//! The wiki itself only knows the *current* level. `wikisource` replays the full revision history
//! of a page to find out who raised it to level 3 (the proofreader) and who raised it to level 4
//! (the validator), taking regressions into account: a page that falls below level 3 loses both
//! credits, and a page that has to be proofread again is credited to whoever does so.
//!
//! **Key Features:**
//!
//! - **Status reconstruction**: a small state machine over quality levels, usable without any
//!   network access.
//! - **Batch analysis**: statuses of many pages fetched with a bounded number of requests in flight.
//! - **Action API client**: page counts of scans, paginated revision histories and user
//!   contributions, built on `reqwest`.
//!
//! ## Getting Started
//!
//! ### Basic Usage
//!
//! Ask who proofread and validated a single page:
//!
//! ```no_run
//! use wikisource::WikisourceClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WikisourceClient::new("en")?;
//!
//!     let status = client.page_status("Page:Frankenstein, or the Modern Prometheus (Revised Edition, 1831).djvu/21").await?;
//!     println!("level {}", status.code);
//!     if let Some(proofread) = &status.proofread {
//!         println!("proofread by {} at {}", proofread.user, proofread.timestamp);
//!     }
//!     if let Some(validate) = &status.validate {
//!         println!("validated by {} at {}", validate.user, validate.timestamp);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Analysing a Whole Scan
//!
//! Combine the page count of a scan with a batch request:
//!
//! ```no_run
//! use wikisource::{WikisourceClient, WikisourceClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WikisourceClientConfig::new("bn")
//!         .user_agent("my-report-bot/1.0 (someone@example.org)")
//!         .concurrency(10);
//!     let client = WikisourceClient::from_config(config)?;
//!
//!     let index = "Gitanjali.djvu";
//!     let count = client.page_count(index).await?;
//!     println!("{} has {count} pages", client.namespaces().index_title(index));
//!     let titles = (1..=count).map(|n| client.namespaces().page_title(index, n));
//!
//!     // fails as a whole if any single page cannot be fetched or analysed
//!     let statuses = client.page_statuses(titles).await?;
//!     let validated = statuses.values().filter(|status| status.validate.is_some()).count();
//!     println!("{validated} of {count} pages validated");
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Offline Analysis
//!
//! Revisions obtained elsewhere (a dump, a cache, a test fixture) can be analysed directly:
//!
//! ```
//! use wikisource::{PageStatus, QualityLevel, Revision};
//!
//! let revision = |revision_id: u64, level: u8, user: &str| Revision {
//!     revision_id,
//!     timestamp: chrono::DateTime::from_timestamp(1_600_000_000 + revision_id as i64, 0).unwrap(),
//!     user: user.into(),
//!     size: 0,
//!     content: format!(r#"<pagequality level="{level}" user="{user}" />"#),
//! };
//!
//! let status = PageStatus::analyse(&[
//!     revision(1, 1, "Alice"),
//!     revision(2, 3, "Bob"),
//!     revision(3, 4, "Carol"),
//! ])
//! .unwrap();
//!
//! assert_eq!(status.code, QualityLevel::Validated);
//! assert_eq!(status.proofread.unwrap().user, "Bob");
//! assert_eq!(status.validate.unwrap().user, "Carol");
//! ```
//!
//! ## Modules and API
//!
//! - [`quality`]: the five quality levels and extraction of the `<pagequality>` marker.
//! - [`revision`]: the [`Revision`] record a history is made of.
//! - [`algorithm`]: [`QualityState`](algorithm::QualityState) and [`PageStatus::analyse`].
//! - [`batch`]: [`analyse_batch`] over any [`RevisionSource`], not just the HTTP client.
//! - [`client`]: [`WikisourceClient`], the Action API client.
//! - [`config`]: [`WikisourceClientConfig`], endpoint selection and defaults.
//! - [`namespace`]: localized names of the `Page:` and `Index:` namespaces.
//!
//! ## Logging and Error Handling
//!
//! - Uses the `tracing` crate: requests are logged at `debug`, batch progress at `info` and
//!   aborted batches at `warn`. Install any `tracing` subscriber to see them.
//! - Every operation returns a typed error built with `thiserror`:
//!   [`FetchError`] for transport and API failures, [`AnalysisError`] for unusable histories, and
//!   [`BatchError`] naming the page that aborted a batch.
//!
//! ## Limitations
//!
//! - Revisions are assumed to be ordered oldest first, which is what the client requests.
//! - Each revision must carry a quality marker. Only `Page:` namespace pages do, so asking for the
//!   status of an ordinary article fails with [`AnalysisError::MalformedRevision`].
//! - A batch is all-or-nothing: there is no partial result when one page fails.

pub mod algorithm;
pub mod batch;
pub mod client;
pub mod config;
pub mod namespace;
pub mod quality;
pub mod revision;
#[cfg(test)]
mod test_support;

pub use algorithm::{AnalysisError, PageStatus, StatusEvent};
pub use batch::{analyse_batch, BatchError, PageError, RevisionSource};
pub use client::{Contribution, FetchError, WikisourceClient};
pub use config::{ConfigError, WikisourceClientConfig};
pub use quality::QualityLevel;
pub use revision::Revision;

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    algorithm::{PageStatus, StatusEvent},
    batch::{self, BatchError, PageError, RevisionSource},
    config::{ConfigError, WikisourceClientConfig},
    namespace::{proofread_namespaces, ProofreadNamespaces},
    revision::Revision,
};

// content is requested with every revision, which the API caps at 50 per request
const REVISIONS_PER_REQUEST: &str = "50";

/// The Errors that may occur while talking to the Action API
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("API error `{code}`: {info}")]
    Api { code: String, info: String },
    #[error("page `{0}` does not exist")]
    MissingPage(CompactString),
    #[error("unexpected API response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    fn malformed(what: impl Into<String>) -> Self {
        FetchError::MalformedResponse(what.into())
    }
}

/// One edit listed by `list=usercontribs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(rename = "revid")]
    pub revision_id: u64,
    #[serde(rename = "pageid")]
    pub page_id: u64,
    #[serde(rename = "ns")]
    pub namespace: i32,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub size: usize,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A client for the Action API of one Wikisource
#[derive(Debug, Clone)]
pub struct WikisourceClient {
    client: reqwest::Client,
    endpoint: Url,
    namespaces: ProofreadNamespaces,
    concurrency: usize,
}

impl WikisourceClient {
    /// Client for the Wikisource in `language` with default settings.
    pub fn new(language: &str) -> Result<Self, ConfigError> {
        Self::from_config(WikisourceClientConfig::new(language))
    }

    pub fn from_config(config: WikisourceClientConfig) -> Result<Self, ConfigError> {
        let endpoint = config.api_endpoint()?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent_str());
        if let Some(timeout) = config.timeout_duration() {
            builder = builder.timeout(timeout);
        }

        Ok(WikisourceClient {
            client: builder.build()?,
            endpoint,
            namespaces: proofread_namespaces(config.language()),
            concurrency: config.concurrency_limit(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn namespaces(&self) -> ProofreadNamespaces {
        self.namespaces
    }

    /// Send one `action=query` request; `continuation` is the `continue` object of the previous response.
    async fn query(
        &self,
        params: &[(&str, &str)],
        continuation: &[(String, String)],
    ) -> Result<Value, FetchError> {
        debug!(?params, ?continuation, "querying {}", self.endpoint);

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .query(continuation)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body: Value = response.json().await?;
        check_api_error(&body)?;

        Ok(body)
    }

    /// Follow `continue` until the API reports no further results, handing every response to `each`.
    async fn query_all(
        &self,
        params: &[(&str, &str)],
        mut each: impl FnMut(&Value) -> Result<(), FetchError>,
    ) -> Result<(), FetchError> {
        let mut continuation = Vec::new();

        loop {
            let body = self.query(params, &continuation).await?;
            each(&body)?;

            match body.get("continue").and_then(Value::as_object) {
                Some(next) => {
                    continuation = next
                        .iter()
                        .filter_map(|(key, value)| {
                            value.as_str().map(|value| (key.clone(), value.to_string()))
                        })
                        .collect();
                }
                None => return Ok(()),
            }
        }
    }

    /// Number of pages of the scan `File:{index}` (a DjVu or PDF).
    #[instrument(skip(self))]
    pub async fn page_count(&self, index: &str) -> Result<u32, FetchError> {
        let title = format!("File:{index}");
        let body = self
            .query(&[("prop", "imageinfo"), ("titles", title.as_str()), ("iiprop", "size")], &[])
            .await?;

        let page = file_page(&body, &title)?;
        page.get("imageinfo")
            .and_then(|info| info.get(0))
            .and_then(|info| info.get("pagecount"))
            .and_then(Value::as_u64)
            .and_then(|count| u32::try_from(count).ok())
            .ok_or_else(|| FetchError::malformed(format!("`{title}` has no page count")))
    }

    /// Full revision history of `title`, oldest first.
    #[instrument(skip(self))]
    pub async fn page_revisions(&self, title: &str) -> Result<Vec<Revision>, FetchError> {
        let mut revisions = Vec::new();

        self.query_all(
            &[
                ("prop", "revisions"),
                ("titles", title),
                ("rvdir", "newer"),
                ("rvlimit", REVISIONS_PER_REQUEST),
                ("rvprop", "ids|user|timestamp|size|content"),
                ("rvslots", "main"),
            ],
            |body| {
                let page = first_page(body, title)?;
                revisions.extend(parse_revisions(page)?);
                Ok(())
            },
        )
        .await?;

        debug!(revisions = revisions.len(), "fetched history");
        Ok(revisions)
    }

    pub async fn page_status(&self, title: &str) -> Result<PageStatus, PageError> {
        batch::analyse_page(self, title).await
    }

    /// Who proofread `title`, if it is currently proofread or validated.
    pub async fn proofreader(&self, title: &str) -> Result<Option<StatusEvent>, PageError> {
        Ok(self.page_status(title).await?.proofread)
    }

    /// Who validated `title`, if it is currently validated.
    pub async fn validator(&self, title: &str) -> Result<Option<StatusEvent>, PageError> {
        Ok(self.page_status(title).await?.validate)
    }

    /// Status of every page in `titles`, fetched concurrently. Fails as a whole if any page fails.
    pub async fn page_statuses<I, T>(&self, titles: I) -> Result<HashMap<String, PageStatus>, BatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        batch::analyse_batch(self, titles, self.concurrency).await
    }

    /// Edits of `user`, newest first, optionally restricted to one namespace id.
    #[instrument(skip(self))]
    pub async fn user_contributions(
        &self,
        user: &str,
        namespace: Option<i32>,
    ) -> Result<Vec<Contribution>, FetchError> {
        let namespace = namespace.map(|ns| ns.to_string());
        let mut params = vec![
            ("list", "usercontribs"),
            ("ucuser", user),
            ("uclimit", "max"),
            ("ucprop", "ids|title|timestamp|size|comment"),
        ];
        if let Some(namespace) = &namespace {
            params.push(("ucnamespace", namespace.as_str()));
        }

        let mut contributions = Vec::new();
        self.query_all(&params, |body| {
            let listed = body
                .get("query")
                .and_then(|query| query.get("usercontribs"))
                .ok_or_else(|| FetchError::malformed("missing `query.usercontribs`"))?;
            let listed: Vec<Contribution> = serde_json::from_value(listed.clone())
                .map_err(|err| FetchError::malformed(err.to_string()))?;
            contributions.extend(listed);
            Ok(())
        })
        .await?;

        debug!(contributions = contributions.len(), "fetched contributions");
        Ok(contributions)
    }

    /// Numeric id of the namespace called `name` (local name, canonical name or alias).
    #[instrument(skip(self))]
    pub async fn namespace_id(&self, name: &str) -> Result<Option<i32>, FetchError> {
        let body = self
            .query(&[("meta", "siteinfo"), ("siprop", "namespaces|namespacealiases")], &[])
            .await?;
        Ok(find_namespace_id(&body, name))
    }

    /// Edits of `user` in the `Page:` namespace, i.e. their proofreading work.
    pub async fn page_contributions(&self, user: &str) -> Result<Vec<Contribution>, FetchError> {
        let namespace = self
            .namespace_id(self.namespaces.page)
            .await?
            .ok_or_else(|| {
                FetchError::malformed(format!("wiki has no `{}` namespace", self.namespaces.page))
            })?;

        self.user_contributions(user, Some(namespace)).await
    }
}

impl RevisionSource for WikisourceClient {
    fn fetch_revisions(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Vec<Revision>, FetchError>> + Send {
        self.page_revisions(title)
    }
}

fn check_api_error(body: &Value) -> Result<(), FetchError> {
    match body.get("error") {
        Some(error) => {
            let field = |name: &str| {
                error
                    .get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            Err(FetchError::Api {
                code: field("code"),
                info: field("info"),
            })
        }
        None => Ok(()),
    }
}

fn query_page(body: &Value) -> Result<&Value, FetchError> {
    body.get("query")
        .and_then(|query| query.get("pages"))
        .and_then(|pages| pages.get(0))
        .ok_or_else(|| FetchError::malformed("missing `query.pages`"))
}

fn flagged(page: &Value, flag: &str) -> bool {
    page.get(flag).and_then(Value::as_bool).unwrap_or(false)
}

/// The single page of a `titles=` query, rejecting missing and invalid titles.
fn first_page<'a>(body: &'a Value, title: &str) -> Result<&'a Value, FetchError> {
    let page = query_page(body)?;
    if flagged(page, "missing") || flagged(page, "invalid") {
        return Err(FetchError::MissingPage(title.into()));
    }

    Ok(page)
}

/// Like [`first_page`] for a `File:` title.
///
/// Files hosted on a shared repository such as Commons have no local page: the API flags them
/// `missing` but also `known`, and still returns their `imageinfo`.
fn file_page<'a>(body: &'a Value, title: &str) -> Result<&'a Value, FetchError> {
    let page = query_page(body)?;
    let shared = flagged(page, "known") || page.get("imageinfo").is_some_and(Value::is_array);
    if flagged(page, "invalid") || (flagged(page, "missing") && !shared) {
        return Err(FetchError::MissingPage(title.into()));
    }

    Ok(page)
}

fn parse_revisions(page: &Value) -> Result<Vec<Revision>, FetchError> {
    let Some(revisions) = page.get("revisions").and_then(Value::as_array) else {
        // continuation responses for other props may carry no revisions
        return Ok(Vec::new());
    };

    revisions.iter().map(parse_revision).collect()
}

fn parse_revision(revision: &Value) -> Result<Revision, FetchError> {
    let revision_id = revision
        .get("revid")
        .and_then(Value::as_u64)
        .ok_or_else(|| FetchError::malformed("revision without `revid`"))?;

    let timestamp = revision
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::malformed(format!("revision {revision_id} has no timestamp")))?
        .parse::<DateTime<Utc>>()
        .map_err(|err| FetchError::malformed(format!("revision {revision_id}: {err}")))?;

    // hidden users and suppressed content come back as flags instead of values
    let user = revision
        .get("user")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let content = revision
        .get("slots")
        .and_then(|slots| slots.get("main"))
        .and_then(|main| main.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let size = revision
        .get("size")
        .and_then(Value::as_u64)
        .map_or(content.len(), |size| size as usize);

    Ok(Revision {
        revision_id,
        timestamp,
        user: user.into(),
        size,
        content: content.to_string(),
    })
}

/// Namespace names are compared the way MediaWiki does: underscores are spaces and the first
/// letter is case-insensitive.
fn normalize_namespace(name: &str) -> String {
    let name = name.trim().replace('_', " ");
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn find_namespace_id(body: &Value, name: &str) -> Option<i32> {
    let query = body.get("query")?;
    let wanted = normalize_namespace(name);
    let named = |entry: &Value, key: &str| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|candidate| normalize_namespace(candidate) == wanted)
    };
    let id_of = |entry: &Value| {
        entry
            .get("id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
    };

    let namespaces = query.get("namespaces").and_then(Value::as_object);
    let by_name = namespaces
        .into_iter()
        .flat_map(|map| map.values())
        .find(|ns| named(ns, "name") || named(ns, "canonical"));
    if let Some(ns) = by_name {
        return id_of(ns);
    }

    query
        .get("namespacealiases")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|alias| named(alias, "alias"))
        .and_then(id_of)
}

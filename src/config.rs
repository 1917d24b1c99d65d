use std::time::Duration;

use compact_str::CompactString;
use url::Url;

pub use crate::batch::DEFAULT_CONCURRENCY;

pub const DEFAULT_USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_DESCRIPTION"),
    ")"
);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Language code of the multilingual Wikisource, which lives at `wikisource.org` without a subdomain.
pub const MULTILINGUAL: &str = "mul";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("`{0}` is not a Wikisource language code")]
    InvalidLanguage(CompactString),
    #[error("invalid API endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Settings for a [`WikisourceClient`](crate::WikisourceClient).
#[derive(Debug, Clone)]
pub struct WikisourceClientConfig {
    language: CompactString,
    user_agent: String,
    timeout: Option<Duration>,
    concurrency: usize,
    // overrides the endpoint derived from `language`
    endpoint: Option<Url>,
}

impl WikisourceClientConfig {
    pub fn new(language: impl Into<CompactString>) -> Self {
        Self {
            language: language.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            concurrency: DEFAULT_CONCURRENCY,
            endpoint: None,
        }
    }

    /// Wikimedia asks API clients to identify themselves with a contact address.
    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..self
        }
    }

    pub fn timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }

    /// Maximum number of API requests in flight during batch operations.
    pub fn concurrency(self, concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            ..self
        }
    }

    pub fn endpoint(self, endpoint: Url) -> Self {
        Self {
            endpoint: Some(endpoint),
            ..self
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency
    }

    pub(crate) fn user_agent_str(&self) -> &str {
        &self.user_agent
    }

    pub(crate) fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }

    /// The `api.php` URL requests are sent to.
    pub fn api_endpoint(&self) -> Result<Url, ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }

        let language = self.language.as_str();
        let valid = !language.is_empty()
            && language
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b == b'-');
        if !valid {
            return Err(ConfigError::InvalidLanguage(self.language.clone()));
        }

        let url = if language == MULTILINGUAL {
            Url::parse("https://wikisource.org/w/api.php")?
        } else {
            Url::parse(&format!("https://{language}.wikisource.org/w/api.php"))?
        };
        Ok(url)
    }
}

impl Default for WikisourceClientConfig {
    fn default() -> Self {
        Self::new("en")
    }
}

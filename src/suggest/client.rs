use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Client;
use tracing::{debug, warn};

use super::parse::{parse_amazon, parse_google};
use super::source::Source;

const GOOGLE_BASE: &str = "https://www.google.com";
const AMAZON_BASE: &str = "https://completion.amazon.com";
// amazon.com (US) marketplace
const AMAZON_MARKETPLACE: &str = "ATVPDKIKX0DER";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_SUGGESTIONS: usize = 10;

/// Completion endpoints reject unidentified clients, so requests present a
/// plain browser user agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Characters to percent-encode in query parameter values.
const QUERY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=')
    .add(b'?');

#[derive(Debug, thiserror::Error)]
pub enum SuggestError {
    #[error("suggestion endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Abstraction for fetching suggestions for one query from one source.
/// Implemented by `SuggestClient` for production; mock implementations used in tests.
pub trait SuggestionSource {
    async fn suggestions(&self, source: Source, query: &str) -> Result<Vec<String>, SuggestError>;
}

#[derive(Clone)]
pub struct SuggestClient {
    http: Client,
    google_base: String,
    amazon_base: String,
}

impl SuggestClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            google_base: GOOGLE_BASE.to_string(),
            amazon_base: AMAZON_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            google_base: base_url.to_string(),
            amazon_base: base_url.to_string(),
        }
    }

    fn endpoint(&self, source: Source, query: &str) -> String {
        let q = utf8_percent_encode(query, QUERY_ENCODE_SET);
        match source {
            Source::Google => format!(
                "{}/complete/search?client=gws-wiz&q={q}&hl=en",
                self.google_base
            ),
            Source::Youtube => format!(
                "{}/complete/search?hl=en&client=youtube&hjson=t&ds=yt&q={q}",
                self.google_base
            ),
            Source::Amazon => format!(
                "{}/api/2017/suggestions?mid={AMAZON_MARKETPLACE}&lop=en_US&alias=aps&prefix={q}",
                self.amazon_base
            ),
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, SuggestError> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "suggestion endpoint returned error status");
            return Err(SuggestError::Status(status.as_u16()));
        }
        Ok(response)
    }

    /// Query every source concurrently, returning `(source, suggestions)`
    /// pairs in `Source::ALL` order and skipping sources that failed.
    pub async fn all_suggestions(&self, query: &str) -> Vec<(Source, Vec<String>)> {
        let (google, amazon, youtube) = tokio::join!(
            self.suggestions(Source::Google, query),
            self.suggestions(Source::Amazon, query),
            self.suggestions(Source::Youtube, query),
        );

        let mut results = Vec::new();
        for (source, outcome) in Source::ALL.into_iter().zip([google, amazon, youtube]) {
            match outcome {
                Ok(suggestions) => results.push((source, suggestions)),
                Err(e) => warn!(source = %source, error = %e, "skipping failed source"),
            }
        }
        results
    }
}

impl SuggestionSource for SuggestClient {
    async fn suggestions(&self, source: Source, query: &str) -> Result<Vec<String>, SuggestError> {
        let url = self.endpoint(source, query);
        let response = self.get(&url).await?;

        let mut suggestions = match source {
            Source::Google | Source::Youtube => parse_google(&response.text().await?),
            Source::Amazon => {
                let data: serde_json::Value = response.json().await?;
                parse_amazon(&data)
            }
        };
        suggestions.truncate(MAX_SUGGESTIONS);

        debug!(source = %source, query = %query, count = suggestions.len(), "suggestions fetched");
        Ok(suggestions)
    }
}

//! Fetch client: one POST per external id, classified into a [`FetchOutcome`]
//!
//! The client never retries. A 429 is reported as [`FetchOutcome::RateLimited`] and
//! the caller decides what to do with it.

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::types::FetchOutcome;

/// Abstraction over the question endpoint, enabling testability.
#[async_trait::async_trait]
pub trait QuestionFetcher: Send + Sync {
    /// Perform a single request for `external_id`
    async fn fetch(&self, external_id: &str) -> FetchOutcome;
}

#[derive(Serialize)]
struct FetchRequest<'a> {
    external_id: &'a str,
}

/// Production [`QuestionFetcher`] backed by a pooled reqwest client.
#[derive(Clone, Debug)]
pub struct HttpQuestionClient {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl HttpQuestionClient {
    /// Build a client from the fetch settings
    ///
    /// `max_idle_per_host` sizes the connection pool; pass the admission limit so
    /// every in-flight request can reuse a connection.
    pub fn new(config: &FetchConfig, max_idle_per_host: usize) -> Result<Self> {
        let endpoint = url::Url::parse(&config.endpoint)
            .map_err(|e| Error::config("fetch.endpoint", format!("invalid URL: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| Error::config("fetch.user_agent", e.to_string()))?;
        headers.insert(USER_AGENT, agent);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(max_idle_per_host.max(1))
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// The endpoint requests are sent to
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl QuestionFetcher for HttpQuestionClient {
    async fn fetch(&self, external_id: &str) -> FetchOutcome {
        let response = match self
            .client
            .post(self.endpoint.clone())
            .json(&FetchRequest { external_id })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                };
                return FetchOutcome::Failed {
                    status: None,
                    reason,
                };
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            match response.json::<serde_json::Value>().await {
                Ok(payload) => FetchOutcome::Success(payload),
                Err(e) => FetchOutcome::Failed {
                    status: Some(status.as_u16()),
                    reason: format!("invalid response body: {e}"),
                },
            }
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            FetchOutcome::RateLimited
        } else {
            FetchOutcome::Failed {
                status: Some(status.as_u16()),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            }
        }
    }
}

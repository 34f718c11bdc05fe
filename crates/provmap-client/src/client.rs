//! HTTP client for the provider map service.
//!
//! Wraps `reqwest` with typed requests/responses, retry on transient errors
//! and the [`ClientError`] taxonomy. Two endpoints are used:
//! `POST providers/search` for paged bounding-box searches and
//! `GET providers/{id}` for a single provider.

use std::time::Duration;

use provmap_core::{AppConfig, Provider};
use reqwest::{Client, RequestBuilder, StatusCode, Url};

use crate::error::ClientError;
use crate::retry::RetryPolicy;
use crate::types::{SearchRequest, SearchResponse};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Client for the provider Search API.
///
/// Use [`SearchClient::from_config`] in the application and
/// [`SearchClient::new`] to point at a mock server in tests.
pub struct SearchClient {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl SearchClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] if the `reqwest::Client` cannot be
    /// built, or [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so `join` appends instead of replacing
        // the last path segment (`.../api/map` + `providers/search`).
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            retry: RetryPolicy {
                max_retries,
                backoff_base_ms,
            },
        })
    }

    /// # Errors
    ///
    /// Same as [`SearchClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_ms,
        )
    }

    /// Fetches one page of providers inside the request's bounding box.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Network`] on transport failure or timeout after all retries.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx answer.
    /// - [`ClientError::MalformedResponse`] if the body lacks a `providers` array.
    pub async fn search_providers(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse, ClientError> {
        let url = self.endpoint("providers/search")?;
        tracing::debug!(%url, page = request.page, page_size = request.page_size, "searching providers");
        let body = self
            .send_with_retry(|| self.client.post(url.clone()).json(request), &url)
            .await?;
        let response = SearchResponse::parse(&body, request)?;
        tracing::debug!(
            page = response.page,
            returned = response.providers.len(),
            total_count = response.total_count,
            total_pages = response.total_pages,
            "search page received"
        );
        Ok(response)
    }

    /// Fetches a single provider by id.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotFound`] if the service answers 404.
    /// - [`ClientError::Network`], [`ClientError::UnexpectedStatus`],
    ///   [`ClientError::MalformedResponse`] as for [`Self::search_providers`].
    pub async fn get_provider(&self, provider_id: i64) -> Result<Provider, ClientError> {
        let url = self.endpoint(&format!("providers/{provider_id}"))?;
        let body = self
            .send_with_retry(|| self.client.get(url.clone()), &url)
            .await
            .map_err(|e| match e {
                ClientError::UnexpectedStatus { status: 404, .. } => {
                    ClientError::NotFound { provider_id }
                }
                other => other,
            })?;
        serde_json::from_str(&body).map_err(|e| ClientError::MalformedResponse {
            context: format!("providers/{provider_id}"),
            source: e,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Sends the request built by `build`, retrying transient failures, and
    /// returns the body of a 2xx answer.
    async fn send_with_retry<B>(&self, build: B, url: &Url) -> Result<String, ClientError>
    where
        B: Fn() -> RequestBuilder,
    {
        self.retry
            .run(url.as_str(), || {
                let request = build();
                let url = url.clone();
                async move {
                    let response = request.send().await?;
                    let status = response.status();
                    if !status.is_success() {
                        if status != StatusCode::NOT_FOUND {
                            tracing::warn!(%url, status = status.as_u16(), "search API returned an error status");
                        }
                        return Err(ClientError::UnexpectedStatus {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                    Ok(response.text().await?)
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> SearchClient {
        SearchClient::new(base_url, 5, "provmap-test/0.1", 0, 0)
            .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let client = test_client("http://localhost:8081/api/map");
        let url = client.endpoint("providers/search").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/api/map/providers/search");
    }

    #[test]
    fn endpoint_strips_extra_trailing_slashes() {
        let client = test_client("http://localhost:8081/api/map//");
        let url = client.endpoint("providers/7").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/api/map/providers/7");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = SearchClient::new("not a url", 5, "ua", 0, 0);
        assert!(matches!(result, Err(ClientError::InvalidBaseUrl { .. })));
    }
}

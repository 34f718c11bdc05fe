use thiserror::Error;

/// Errors returned by the provider Search API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure from the underlying HTTP client, including timeouts.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider-by-id endpoint answered 404.
    #[error("provider {provider_id} not found")]
    NotFound { provider_id: i64 },

    /// Any other non-2xx answer.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The body is not JSON or does not have the expected shape, e.g. a
    /// search response without a `providers` array.
    #[error("malformed response for {context}: {source}")]
    MalformedResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ClientError {
    /// `true` when the error came from the HTTP client's own timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Network(e) if e.is_timeout())
    }
}

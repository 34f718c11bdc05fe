//! Retry with exponential back-off and jitter for Search API calls.
//!
//! Only transient failures are retried. A request that ends in a timeout
//! after the last attempt is returned to the caller as a normal
//! [`ClientError::Network`] error.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

const MAX_DELAY_MS: u64 = 10_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures, HTTP 5xx.
///
/// **Not retriable:** 404 and other 4xx answers, malformed bodies and
/// configuration errors. Retrying would produce the same result.
pub(crate) fn is_retriable(err: &ClientError) -> bool {
    match err {
        ClientError::Network(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ClientError::UnexpectedStatus { status, .. } => *status >= 500,
        ClientError::NotFound { .. }
        | ClientError::MalformedResponse { .. }
        | ClientError::InvalidBaseUrl { .. } => false,
    }
}

/// How often and how patiently a failed Search API call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub(crate) max_retries: u32,
    /// Delay before the first retry; doubles for every retry after it.
    pub(crate) backoff_base_ms: u64,
}

impl RetryPolicy {
    /// Sleep before retry number `retry` (1-based): the doubled base, capped
    /// at 10 s, then jittered by up to 25 % either way.
    fn delay(self, retry: u32) -> Duration {
        let doublings = retry.saturating_sub(1).min(10);
        let nominal = self
            .backoff_base_ms
            .saturating_mul(1 << doublings)
            .min(MAX_DELAY_MS);
        Duration::from_millis(rand::random_range(nominal * 3 / 4..=nominal * 5 / 4))
    }

    /// Calls `operation` until it succeeds, fails with a non-retriable
    /// error or has been retried `max_retries` times. `url` only labels the
    /// log lines.
    pub(crate) async fn run<T, F, Fut>(self, url: &str, mut operation: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut retry = 0u32;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if retry == self.max_retries || !is_retriable(&err) {
                if retry > 0 {
                    tracing::warn!(url, retries = retry, error = %err, "search API request gave up");
                }
                return Err(err);
            }
            retry += 1;
            let delay = self.delay(retry);
            tracing::warn!(
                url,
                retry,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "search API request failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    fn status(status: u16) -> ClientError {
        ClientError::UnexpectedStatus {
            status,
            url: "http://localhost:8081/api/map/providers/search".to_owned(),
        }
    }

    fn malformed() -> ClientError {
        ClientError::MalformedResponse {
            context: "providers/search(page=1)".to_owned(),
            source: serde_json::from_str::<()>("{").unwrap_err(),
        }
    }

    /// Replays `script` one entry per attempt and reports how many attempts ran.
    async fn replay(
        max_retries: u32,
        script: Vec<Result<&'static str, ClientError>>,
    ) -> (Result<&'static str, ClientError>, usize) {
        let total = script.len();
        let script = Mutex::new(VecDeque::from(script));
        let policy = RetryPolicy {
            max_retries,
            backoff_base_ms: 0,
        };
        let result = policy
            .run("http://localhost:8081/api/map/providers/search", || {
                let next = script.lock().unwrap().pop_front();
                async move { next.unwrap_or(Ok("script exhausted")) }
            })
            .await;
        let remaining = script.lock().unwrap().len();
        (result, total - remaining)
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!is_retriable(&ClientError::NotFound { provider_id: 9 }));
    }

    #[test]
    fn malformed_response_is_not_retriable() {
        assert!(!is_retriable(&malformed()));
    }

    #[test]
    fn only_server_errors_are_retriable_statuses() {
        assert!(is_retriable(&status(503)));
        assert!(is_retriable(&status(500)));
        assert!(!is_retriable(&status(400)));
        assert!(!is_retriable(&status(422)));
    }

    #[tokio::test]
    async fn first_success_is_returned_without_retrying() {
        let (result, attempts) = replay(3, vec![Ok("page")]).await;
        assert_eq!(result.unwrap(), "page");
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn malformed_body_fails_on_first_attempt() {
        let (result, attempts) = replay(3, vec![Err(malformed()), Ok("page")]).await;
        assert!(matches!(result, Err(ClientError::MalformedResponse { .. })));
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let (result, attempts) =
            replay(3, vec![Err(status(502)), Err(status(503)), Ok("page")]).await;
        assert_eq!(result.unwrap(), "page");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn last_error_is_returned_once_retries_run_out() {
        let script = vec![Err(status(500)), Err(status(502)), Err(status(504)), Ok("late")];
        let (result, attempts) = replay(2, script).await;
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedStatus { status: 504, .. })
        ));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn zero_retries_means_a_single_attempt() {
        let (result, attempts) = replay(0, vec![Err(status(503)), Ok("page")]).await;
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn delay_doubles_per_retry_within_jitter_and_cap() {
        let policy = RetryPolicy {
            max_retries: 20,
            backoff_base_ms: 100,
        };
        let first = policy.delay(1);
        assert!(first >= Duration::from_millis(75) && first <= Duration::from_millis(125));
        let third = policy.delay(3);
        assert!(third >= Duration::from_millis(300) && third <= Duration::from_millis(500));
        assert!(policy.delay(20) <= Duration::from_millis(12_500));
    }

    #[test]
    fn zero_base_never_sleeps() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff_base_ms: 0,
        };
        assert_eq!(policy.delay(1), Duration::ZERO);
        assert_eq!(policy.delay(5), Duration::ZERO);
    }

    #[tokio::test]
    async fn connection_refused_counts_as_transient() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        assert!(is_retriable(&ClientError::Network(err)));
    }
}

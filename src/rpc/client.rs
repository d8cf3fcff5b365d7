use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FailureKind, RpcFailure};
use crate::rpc::cancel::CancelSignal;
use crate::rpc::classify::classify;
use crate::rpc::pool::EndpointPool;
use crate::rpc::transport::{HttpTransport, TransportError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Timing knobs for [`RpcClient`].
#[derive(Debug, Clone, Copy)]
pub struct RpcOptions {
    /// Upper bound for a single request against a single endpoint.
    pub timeout: Duration,
    /// Fixed pause between two failed attempts.
    pub retry_delay: Duration,
}

impl Default for RpcOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Issues logical JSON-RPC calls with round-robin failover.
///
/// One call makes at most one attempt per pooled endpoint. The first success
/// wins. `InvalidInput` and `NotFound` stop the loop at once. Other failures
/// are retried after a fixed delay, and once every attempt is spent the
/// failure of the last attempt is returned. Worst-case latency is therefore
/// `N * (timeout + retry_delay)`.
#[derive(Clone)]
pub struct RpcClient {
    pool: Arc<EndpointPool>,
    transport: Arc<HttpTransport>,
    options: RpcOptions,
}

impl RpcClient {
    pub fn new(pool: Arc<EndpointPool>, options: RpcOptions) -> Result<Self, RpcFailure> {
        let transport = HttpTransport::new(options.timeout)
            .map_err(|e| RpcFailure::new(FailureKind::Unknown, e.to_string(), 0))?;
        Ok(Self {
            pool,
            transport: Arc::new(transport),
            options,
        })
    }

    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    pub fn options(&self) -> RpcOptions {
        self.options
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcFailure> {
        self.call_with_cancel(method, params, &CancelSignal::never())
            .await
    }

    /// Like [`RpcClient::call`], but stops when `cancel` fires. Cancellation is
    /// checked before each attempt, and it also interrupts an in-flight request
    /// or the inter-attempt delay. An interrupted request is dropped.
    pub async fn call_with_cancel<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        cancel: &CancelSignal,
    ) -> Result<T, RpcFailure> {
        let attempts = self.pool.len();
        let mut last_failure: Option<RpcFailure> = None;

        for attempt in 0..attempts {
            let attempt_no = attempt as u32;
            if cancel.is_cancelled() {
                return Err(RpcFailure::cancelled(attempt_no));
            }

            let endpoint = self.pool.next();
            debug!(method, attempt = attempt_no, endpoint = %endpoint, "rpc.attempt");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RpcFailure::cancelled(attempt_no)),
                result = self.transport.send(endpoint, method, &params) => result,
            };

            let decoded = outcome.and_then(|value| {
                serde_json::from_value::<T>(value).map_err(|e| {
                    TransportError::InvalidResponse(format!("unexpected {} payload: {}", method, e))
                })
            });

            let error = match decoded {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let failure = RpcFailure::new(classify(&error), error.to_string(), attempt_no);
            warn!(
                method,
                attempt = attempt_no,
                endpoint = %endpoint,
                kind = %failure.kind,
                error = %failure.message,
                "rpc.attempt_failed"
            );

            if !failure.kind.is_retryable() {
                return Err(failure);
            }
            last_failure = Some(failure);

            if attempt + 1 < attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RpcFailure::cancelled(attempt_no)),
                    _ = tokio::time::sleep(self.options.retry_delay) => {}
                }
            }
        }

        Err(last_failure
            .unwrap_or_else(|| RpcFailure::new(FailureKind::Unknown, "no endpoint attempted", 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::cancel::cancel_pair;
    use mockito::{Mock, Server, ServerGuard};
    use serde_json::json;
    use std::time::Instant;

    fn client_for(urls: &[String], retry_delay: Duration) -> RpcClient {
        let pool = Arc::new(EndpointPool::new(urls).unwrap());
        RpcClient::new(
            pool,
            RpcOptions {
                timeout: Duration::from_secs(5),
                retry_delay,
            },
        )
        .unwrap()
    }

    async fn ok_server(result: serde_json::Value, hits: usize) -> (ServerGuard, Mock) {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string())
            .expect(hits)
            .create_async()
            .await;
        (server, mock)
    }

    async fn failing_server(status: usize, body: &str, hits: usize) -> (ServerGuard, Mock) {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(status)
            .with_body(body)
            .expect(hits)
            .create_async()
            .await;
        (server, mock)
    }

    #[tokio::test]
    async fn test_first_success_stops_failover() {
        let (first, first_mock) = ok_server(json!("0x2a"), 1).await;
        let (second, second_mock) = ok_server(json!("0x2b"), 0).await;

        let client = client_for(&[first.url(), second.url()], Duration::from_millis(10));
        let number: String = client.call("eth_blockNumber", json!([])).await.unwrap();

        assert_eq!(number, "0x2a");
        first_mock.assert_async().await;
        second_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fails_over_to_next_endpoint() {
        let (bad, bad_mock) = failing_server(429, "too many", 1).await;
        let (good, good_mock) = ok_server(json!("0x2b"), 1).await;

        let client = client_for(&[bad.url(), good.url()], Duration::from_millis(10));
        let number: String = client.call("eth_blockNumber", json!([])).await.unwrap();

        assert_eq!(number, "0x2b");
        bad_mock.assert_async().await;
        good_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_not_found_endpoint_is_skipped() {
        let (retired, retired_mock) = failing_server(404, "404 page not found", 1).await;
        let (good, good_mock) = ok_server(json!("0x2b"), 1).await;

        let client = client_for(&[retired.url(), good.url()], Duration::from_millis(10));
        let number: String = client.call("eth_blockNumber", json!([])).await.unwrap();

        assert_eq!(number, "0x2b");
        retired_mock.assert_async().await;
        good_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exhaustion_tries_each_endpoint_once_and_reports_last() {
        let (a, a_mock) = failing_server(429, "slow down", 1).await;
        let (b, b_mock) = failing_server(503, "backend network unreachable", 1).await;
        let (c, c_mock) = failing_server(404, "boom", 1).await;

        let client = client_for(&[a.url(), b.url(), c.url()], Duration::from_millis(10));
        let err = client
            .call::<String>("eth_blockNumber", json!([]))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::Unknown);
        assert_eq!(err.attempt, 2);
        assert!(err.message.contains("boom"));
        a_mock.assert_async().await;
        b_mock.assert_async().await;
        c_mock.assert_async().await;

        // Cursor wrapped back to the first endpoint.
        assert_eq!(client.pool().next().as_str(), a.url());
    }

    #[tokio::test]
    async fn test_non_retryable_failure_returns_immediately() {
        let mut first = Server::new_async().await;
        let first_mock = first
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "invalid argument"}})
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let (second, second_mock) = ok_server(json!("0x1"), 0).await;

        let client = client_for(&[first.url(), second.url()], Duration::from_millis(10));
        let err = client
            .call::<String>("eth_getBalance", json!(["nope", "latest"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::InvalidInput);
        assert_eq!(err.attempt, 0);
        first_mock.assert_async().await;
        second_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_retried() {
        let (bad, _bad_mock) = ok_server(json!({"unexpected": true}), 1).await;
        let (good, _good_mock) = ok_server(json!("0x5"), 1).await;

        let client = client_for(&[bad.url(), good.url()], Duration::from_millis(10));
        let number: String = client.call("eth_blockNumber", json!([])).await.unwrap();
        assert_eq!(number, "0x5");
    }

    #[tokio::test]
    async fn test_null_result_decodes_to_none() {
        let (server, _mock) = ok_server(json!(null), 1).await;
        let client = client_for(&[server.url()], Duration::from_millis(10));
        let value: Option<serde_json::Value> = client
            .call("eth_getTransactionByHash", json!(["0x00"]))
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_retry_delay_applied_between_attempts_only() {
        let (a, _a) = failing_server(500, "one", 1).await;
        let (b, _b) = failing_server(500, "two", 1).await;

        let client = client_for(&[a.url(), b.url()], Duration::from_millis(200));
        let started = Instant::now();
        let _ = client.call::<String>("eth_blockNumber", json!([])).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_cancel_during_retry_delay() {
        let (a, a_mock) = failing_server(500, "one", 1).await;
        let (b, b_mock) = failing_server(500, "two", 0).await;

        let client = client_for(&[a.url(), b.url()], Duration::from_secs(30));
        let (handle, signal) = cancel_pair();

        let call = tokio::spawn(async move {
            client
                .call_with_cancel::<String>("eth_blockNumber", json!([]), &signal)
                .await
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.cancel();

        let err = tokio::time::timeout(Duration::from_secs(2), call)
            .await
            .expect("cancel did not interrupt the delay")
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Cancelled);
        a_mock.assert_async().await;
        b_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_attempt() {
        let (server, mock) = ok_server(json!("0x1"), 0).await;
        let client = client_for(&[server.url()], Duration::from_millis(10));
        let (handle, signal) = cancel_pair();
        handle.cancel();

        let err = client
            .call_with_cancel::<String>("eth_blockNumber", json!([]), &signal)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Cancelled);
        assert_eq!(err.attempt, 0);
        mock.assert_async().await;
    }
}

//! Error types for basewatch

use std::fmt;

/// Classification of a failed ledger lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NetworkError,
    Timeout,
    RateLimited,
    NotFound,
    InvalidInput,
    /// The node answered but had no block for the requested tag.
    EmptyResult,
    Cancelled,
    Unknown,
}

impl FailureKind {
    /// Whether another endpoint might succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureKind::NetworkError
                | FailureKind::Timeout
                | FailureKind::RateLimited
                | FailureKind::Unknown
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NetworkError => "network_error",
            FailureKind::Timeout => "timeout",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::NotFound => "not_found",
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::EmptyResult => "empty_result",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure surfaced by the RPC client or the ledger service.
///
/// `attempt` is the zero-based index of the attempt that produced the failure.
/// Failures detected before any network call carry attempt `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcFailure {
    pub kind: FailureKind,
    pub message: String,
    pub attempt: u32,
    /// Raised by local validation or lookup semantics rather than reported
    /// by a node.
    pub local: bool,
}

impl RpcFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>, attempt: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            attempt,
            local: false,
        }
    }

    /// Rejected input, detected before any network call.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            local: true,
            ..Self::new(FailureKind::InvalidInput, message, 0)
        }
    }

    /// The node answered and has no record of the requested item.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            local: true,
            ..Self::new(FailureKind::NotFound, message, 0)
        }
    }

    pub fn cancelled(attempt: u32) -> Self {
        Self::new(FailureKind::Cancelled, "request cancelled", attempt)
    }

    /// Short message suitable for end users. Never contains endpoint addresses.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::NetworkError => {
                "Network error - please check your connection".to_string()
            }
            FailureKind::Timeout => "Request timeout - please try again".to_string(),
            FailureKind::RateLimited => {
                "Rate limit exceeded - please try again later".to_string()
            }
            FailureKind::EmptyResult => "Ledger returned no block".to_string(),
            FailureKind::Cancelled => "Request cancelled".to_string(),
            FailureKind::NotFound if !self.local => {
                "Ledger data not available - please try again".to_string()
            }
            FailureKind::InvalidInput if !self.local => "Ledger rejected the request".to_string(),
            FailureKind::NotFound | FailureKind::InvalidInput | FailureKind::Unknown => {
                if self.message.is_empty() {
                    "Failed to fetch data".to_string()
                } else {
                    self.message.clone()
                }
            }
        }
    }
}

impl fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (attempt {}): {}",
            self.kind,
            self.attempt + 1,
            self.message
        )
    }
}

impl std::error::Error for RpcFailure {}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, RpcFailure>;

//! Maps transport failures onto [`FailureKind`].
//!
//! Structured signals (timeouts, connect errors, HTTP status, JSON-RPC codes)
//! decide first. Message substrings are only consulted for JSON-RPC errors
//! whose code carries no meaning of its own.

use crate::error::FailureKind;
use crate::rpc::transport::TransportError;

/// JSON-RPC "limit exceeded", used by most providers for rate limiting.
const RPC_LIMIT_EXCEEDED: i64 = -32005;
/// JSON-RPC "resource not found".
const RPC_RESOURCE_NOT_FOUND: i64 = -32001;
const RPC_INVALID_REQUEST: i64 = -32600;
const RPC_METHOD_NOT_FOUND: i64 = -32601;
const RPC_INVALID_PARAMS: i64 = -32602;

pub fn classify(error: &TransportError) -> FailureKind {
    match error {
        TransportError::Timeout => FailureKind::Timeout,
        TransportError::Connect(_) | TransportError::Network(_) => FailureKind::NetworkError,
        TransportError::Http(429, _) => FailureKind::RateLimited,
        TransportError::Http(408 | 504, _) => FailureKind::Timeout,
        // The endpoint itself misbehaved; another endpoint may not.
        TransportError::Http(500..=599, _) => FailureKind::NetworkError,
        TransportError::Http(_, _) => FailureKind::Unknown,
        TransportError::Rpc { code, message } => match *code {
            RPC_LIMIT_EXCEEDED => FailureKind::RateLimited,
            RPC_INVALID_REQUEST | RPC_INVALID_PARAMS => FailureKind::InvalidInput,
            RPC_RESOURCE_NOT_FOUND => FailureKind::NotFound,
            // Provider does not serve this method; another endpoint may.
            RPC_METHOD_NOT_FOUND => FailureKind::Unknown,
            _ => classify_message(message),
        },
        TransportError::InvalidResponse(_) | TransportError::Setup(_) => FailureKind::Unknown,
    }
}

/// Fallback for unstructured messages: first matching substring wins.
pub fn classify_message(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        FailureKind::Timeout
    } else if lower.contains("network") || lower.contains("connection") {
        FailureKind::NetworkError
    } else if lower.contains("rate limit") || lower.contains("too many requests") {
        FailureKind::RateLimited
    } else if lower.contains("not found") {
        FailureKind::NotFound
    } else {
        FailureKind::Unknown
    }
}

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::RpcFailure;

/// A remote RPC endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered set of endpoints handed out round-robin.
///
/// Membership is fixed at construction. The cursor is advanced with an atomic
/// wrap-around update, so concurrent callers never lose an increment and the
/// cursor never leaves `[0, len)`. No health is tracked: a failing endpoint
/// stays in rotation.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    cursor: AtomicUsize,
}

impl EndpointPool {
    /// Builds a pool from raw URLs. Blank entries are dropped.
    pub fn new<I, S>(urls: I) -> Result<Self, RpcFailure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoints: Vec<Endpoint> = urls
            .into_iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .map(Endpoint)
            .collect();

        if endpoints.is_empty() {
            return Err(RpcFailure::invalid_input("no RPC endpoints configured"));
        }

        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Returns the endpoint under the cursor and advances it.
    pub fn next(&self) -> &Endpoint {
        let len = self.endpoints.len();
        let index = match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
        {
            Ok(previous) | Err(previous) => previous,
        };
        &self.endpoints[index]
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

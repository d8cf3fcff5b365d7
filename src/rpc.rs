//! JSON-RPC access to the remote ledger, split into endpoint selection,
//! transport, failure classification and the retrying client.

pub mod cancel;
pub mod classify;
pub mod client;
pub mod pool;
pub mod transport;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use client::{RpcClient, RpcOptions};
pub use pool::{Endpoint, EndpointPool};
pub use transport::{HttpTransport, TransportError};

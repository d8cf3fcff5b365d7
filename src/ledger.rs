//! Ledger queries split into wire/domain types, filtering and the query service

pub mod filter;
pub mod service;
pub mod types;

pub use filter::{clamp_limit, direction_for, filter_transactions};
pub use service::{FetchRole, LedgerService};
pub use types::*;

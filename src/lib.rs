//! basewatch - resilient JSON-RPC retrieval and normalization for Base
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## RPC Plumbing
//! - [`rpc`] - Endpoint pool, HTTP transport, failure classification and the
//!   retrying client
//!
//! ## Ledger
//! - [`ledger`] - Block, transaction and wallet queries with address filtering
//!
//! ## Normalization
//! - [`units`] - Exact wei/ETH/Gwei conversion over 256-bit integers
//! - [`address`] - Address and hash normalization
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Failure taxonomy
//! - [`api`] - REST API (feature `api`)

#![forbid(unsafe_code)]

// ============================================================================
// RPC Plumbing
// ============================================================================
pub mod rpc;

// ============================================================================
// Ledger
// ============================================================================
pub mod ledger;

// ============================================================================
// Normalization
// ============================================================================
pub mod address;
pub mod units;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

// ============================================================================
// Interfaces
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

//! Fork-aware method resolution for the Engine API.
//!
//! An execution engine exposes a JSON-RPC method set that changes across consensus upgrades.
//! This crate keeps a catalog of every versioned method implementation, builds a per-network
//! table of which version applies at which milestone, and resolves logical methods against
//! that table at call time.

pub mod engine_api;
pub mod serde_utils;
pub mod test_utils;

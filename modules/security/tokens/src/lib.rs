#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Token manager plugins.
//!
//! [`RndTokenManager`] issues random reference tokens kept in an
//! in-memory TTL cache. Tokens are opaque: nothing is encoded in them,
//! the cache entry carries the roles. Suitable for single-node
//! deployments; a multi-node gateway wants a shared store behind the
//! same [`TokenManager`](gatehouse_security::TokenManager) contract.

mod rnd;

pub use rnd::{RndTokenManager, RndTokenManagerConfig};

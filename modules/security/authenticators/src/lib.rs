#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authenticator plugins.
//!
//! Ships the in-memory static realm: a fixed id to password-and-roles
//! table taken from configuration. Credential-storage backends (files,
//! LDAP, databases) live outside this workspace and plug in through
//! the same [`Authenticator`](gatehouse_security::Authenticator)
//! contract.

mod static_realm;

pub use static_realm::{StaticRealmAuthenticator, StaticRealmConfig, UserEntry};

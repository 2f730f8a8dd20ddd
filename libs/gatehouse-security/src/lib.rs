#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Security model and plugin contracts for the Gatehouse pipeline.
//!
//! This crate defines what a security plugin *is*: the identity model
//! ([`Account`], [`Credential`]), the request-scoped [`SecurityContext`],
//! the [`Exchange`] the pipeline operates on, and the four plugin
//! contracts ([`AuthMechanism`], [`Authenticator`], [`Authorizer`],
//! [`TokenManager`]) plus the [`PluginRegistry`] that holds the
//! configured, ordered sets of them.
//!
//! How those plugins are composed into a per-request chain lives in
//! `gatehouse-pipeline`.

pub mod account;
pub mod authenticator;
pub mod authorizer;
pub mod context;
pub mod credential;
pub mod exchange;
pub mod interceptor;
pub mod mechanism;
pub mod registry;
pub mod token;

pub use account::Account;
pub use authenticator::{AuthError, Authenticator};
pub use authorizer::{Authorizer, AuthorizerKind, AuthzError};
pub use context::SecurityContext;
pub use credential::Credential;
pub use exchange::Exchange;
pub use interceptor::{InterceptPoint, Interceptor};
pub use mechanism::{AuthMechanism, AuthOutcome, MechanismError};
pub use registry::{PluginRegistry, PluginRegistryBuilder, RegistryError};
pub use token::{
    AUTH_TOKEN_HEADER, AUTH_TOKEN_LOCATION_HEADER, AUTH_TOKEN_VALID_HEADER, Token, TokenManager,
    inject_token_headers,
};

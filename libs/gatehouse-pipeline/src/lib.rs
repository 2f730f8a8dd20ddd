#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! The Gatehouse request security chain.
//!
//! Composes the plugins registered in a
//! [`PluginRegistry`](gatehouse_security::PluginRegistry) into an
//! ordered per-request pipeline:
//!
//! ```text
//! mechanism registration -> auth-required constraint -> terminal
//! authentication barrier -> token injection -> authorization engine
//! -> protected handler
//! ```
//!
//! Stage objects are built once at startup
//! ([`SecurityChainComponents`]) and relinked per protected resource
//! ([`SecurityChain`]); only the linkage differs between resources.
//! Every stage boundary checks exchange completion before calling the
//! next stage.

pub mod adapter;
pub mod axum_bridge;
pub mod chain;
pub mod cors;
pub mod engine;
pub mod stages;

pub use adapter::MechanismChainAdapter;
pub use axum_bridge::{Identity, SecuredState, security_middleware};
pub use chain::{
    PipelineError, SecurityChain, SecurityChainComponents, SecurityStage, TerminalHandler,
};
pub use engine::AuthorizationEngine;

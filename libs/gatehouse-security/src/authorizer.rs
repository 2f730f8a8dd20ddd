use async_trait::async_trait;

use crate::exchange::Exchange;

/// How an authorizer's verdict is combined with the others.
///
/// A request is authorized iff no enabled vetoer rejects it AND at
/// least one enabled allower accepts it. With no authorizers
/// configured at all, the engine denies (fail-closed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizerKind {
    /// Can grant access.
    Allower,
    /// Can deny access.
    Vetoer,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("authorizer evaluation failed: {0}")]
    Evaluation(String),
}

/// Decides whether a request is allowed.
#[async_trait]
pub trait Authorizer: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> AuthorizerKind;

    /// Evaluate the request.
    ///
    /// # Errors
    /// Evaluation failures are interpreted by the engine: a failing
    /// vetoer is a veto, a failing allower abstains.
    async fn is_allowed(&self, exchange: &Exchange) -> Result<bool, AuthzError>;

    /// Whether this authorizer needs the request authenticated before
    /// it can evaluate it.
    ///
    /// The constraint stage enforces authentication only when *every*
    /// enabled allower returns true here; an allower that can grant
    /// anonymous access keeps the resource reachable without
    /// credentials. Changing this conjunction to a disjunction changes
    /// which resources are publicly reachable; preserve it exactly.
    async fn is_authentication_required(&self, _exchange: &Exchange) -> bool {
        true
    }
}

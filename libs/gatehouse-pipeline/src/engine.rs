use std::sync::Arc;

use gatehouse_security::{Authorizer, Exchange, PluginRegistry};

/// One authorizer's contribution to the overall decision.
///
/// The engine maps evaluation failures onto this explicitly: a failing
/// vetoer is a `Reject` (fail-closed), a failing allower an `Abstain`
/// (that allower just cannot grant; the next one still gets a chance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vote {
    Accept,
    Reject,
    Abstain,
}

/// Two-phase, fail-closed authorization.
///
/// Vetoers run first, allowers second, each group in registration
/// order and short-circuiting: the first veto decides, and the first
/// accepting allower decides. Short-circuiting is part of the
/// contract, not an optimization: once the outcome is determined no
/// later authorizer may run, so authorizers with side effects are
/// never invoked needlessly.
pub struct AuthorizationEngine {
    registry: Arc<PluginRegistry>,
}

impl AuthorizationEngine {
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Decide whether the request is allowed.
    ///
    /// With no authorizers configured at all the answer is `false`:
    /// the pipeline never fails open.
    pub async fn is_allowed(&self, exchange: &Exchange) -> bool {
        if self.registry.authorizers().is_empty() {
            tracing::warn!("no authorizers configured, denying request");
            return false;
        }

        for vetoer in self.registry.vetoers() {
            if !Self::is_applicable(vetoer, exchange).await {
                continue;
            }
            match Self::vetoer_vote(vetoer, exchange).await {
                Vote::Reject => {
                    tracing::debug!(authorizer = vetoer.name(), "request vetoed");
                    return false;
                }
                Vote::Accept | Vote::Abstain => {}
            }
        }

        for allower in self.registry.allowers() {
            if !Self::is_applicable(allower, exchange).await {
                continue;
            }
            match Self::allower_vote(allower, exchange).await {
                Vote::Accept => {
                    tracing::debug!(authorizer = allower.name(), "request allowed");
                    return true;
                }
                Vote::Reject | Vote::Abstain => {}
            }
        }

        false
    }

    /// An authorizer only participates when its authentication
    /// requirement is satisfied for this request.
    async fn is_applicable(authorizer: &Arc<dyn Authorizer>, exchange: &Exchange) -> bool {
        !authorizer.is_authentication_required(exchange).await
            || exchange.security().is_authenticated()
    }

    async fn vetoer_vote(vetoer: &Arc<dyn Authorizer>, exchange: &Exchange) -> Vote {
        match vetoer.is_allowed(exchange).await {
            Ok(true) => Vote::Accept,
            Ok(false) => Vote::Reject,
            Err(e) => {
                tracing::warn!(authorizer = vetoer.name(), error = %e, "vetoer failed, treating as veto");
                Vote::Reject
            }
        }
    }

    async fn allower_vote(allower: &Arc<dyn Authorizer>, exchange: &Exchange) -> Vote {
        match allower.is_allowed(exchange).await {
            Ok(true) => Vote::Accept,
            Ok(false) => Vote::Reject,
            Err(e) => {
                tracing::warn!(authorizer = allower.name(), error = %e, "allower failed, abstaining");
                Vote::Abstain
            }
        }
    }
}

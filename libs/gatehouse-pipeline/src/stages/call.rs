use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_security::{AuthOutcome, Exchange, InterceptPoint, PluginRegistry};
use http::StatusCode;

use crate::chain::{PipelineError, SecurityStage};
use crate::cors;

/// The barrier at the end of the authentication phase.
///
/// Authentication is always *attempted*, even on resources that allow
/// anonymous access, because a later authorizer may depend on knowing
/// whether the caller authenticated. The request fails here only when
/// the chain could not proceed, or authentication is required by all
/// enabled allowers and did not happen.
///
/// On failure: after-failed-auth interceptors run first (they may set
/// their own error status, e.g. 429, which wins over the default 401),
/// then CORS headers are injected, 401 is set if no status was, and
/// the exchange is terminated.
pub struct AuthenticationCallStage {
    registry: Arc<PluginRegistry>,
}

impl AuthenticationCallStage {
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Run the registered mechanism chain. First `Authenticated` wins
    /// and short-circuits the remaining mechanisms. When nothing
    /// authenticated and authentication is required, every mechanism
    /// contributes its challenge and the chain reports failure.
    async fn authenticate(exchange: &mut Exchange) -> Result<bool, PipelineError> {
        let mechanisms = exchange.security().mechanisms();

        for mechanism in &mechanisms {
            match mechanism.authenticate(exchange).await? {
                AuthOutcome::Authenticated => return Ok(true),
                // The chain adapter remaps NotAuthenticated; both
                // remaining outcomes mean "give the next one a chance".
                AuthOutcome::NotAttempted | AuthOutcome::NotAuthenticated => {}
            }
        }

        if exchange.security().is_authentication_required() {
            for mechanism in &mechanisms {
                mechanism.send_challenge(exchange).await;
            }
            return Ok(false);
        }

        Ok(true)
    }
}

#[async_trait]
impl SecurityStage for AuthenticationCallStage {
    fn name(&self) -> &str {
        "authentication-call"
    }

    async fn handle(&self, exchange: &mut Exchange) -> Result<(), PipelineError> {
        let proceeded = Self::authenticate(exchange).await?;

        let security = exchange.security();
        let passed = proceeded
            && (!security.is_authentication_required() || security.is_authenticated());

        if passed {
            return Ok(());
        }

        for interceptor in self.registry.interceptors_at(InterceptPoint::AfterFailedAuth) {
            interceptor.handle(exchange).await;
        }

        cors::inject_access_control_allow_headers(exchange);
        exchange.set_response_status(StatusCode::UNAUTHORIZED);
        exchange.end();
        Ok(())
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_security::{Exchange, PluginRegistry};
use http::StatusCode;

use crate::chain::{PipelineError, SecurityStage};
use crate::cors;
use crate::engine::AuthorizationEngine;

/// Runs the two-phase authorization engine and terminates denied
/// exchanges with 403.
pub struct AuthorizationStage {
    engine: AuthorizationEngine,
}

impl AuthorizationStage {
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            engine: AuthorizationEngine::new(registry),
        }
    }
}

#[async_trait]
impl SecurityStage for AuthorizationStage {
    fn name(&self) -> &str {
        "authorization"
    }

    async fn handle(&self, exchange: &mut Exchange) -> Result<(), PipelineError> {
        if self.engine.is_allowed(exchange).await {
            return Ok(());
        }

        cors::inject_access_control_allow_headers(exchange);
        exchange.set_response_status(StatusCode::FORBIDDEN);
        exchange.end();
        Ok(())
    }
}

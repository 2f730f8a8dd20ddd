use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_security::{Exchange, PluginRegistry};

use crate::chain::{PipelineError, SecurityStage};

/// Computes whether authentication is a hard requirement for this
/// request: true iff *every* enabled allower reports that it requires
/// authentication. A single allower that can grant anonymous access is
/// enough to lift the requirement, and with no allowers at all it is
/// not required (empty conjunction).
pub struct AuthRequiredConstraintStage {
    registry: Arc<PluginRegistry>,
}

impl AuthRequiredConstraintStage {
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl SecurityStage for AuthRequiredConstraintStage {
    fn name(&self) -> &str {
        "auth-required-constraint"
    }

    async fn handle(&self, exchange: &mut Exchange) -> Result<(), PipelineError> {
        let mut any_allower = false;
        let mut all_require = true;

        for allower in self.registry.allowers() {
            any_allower = true;
            if !allower.is_authentication_required(exchange).await {
                all_require = false;
                break;
            }
        }

        let required = any_allower && all_require;
        exchange.security_mut().set_authentication_required(required);

        tracing::trace!(auth_required = required, "constraint computed");
        Ok(())
    }
}

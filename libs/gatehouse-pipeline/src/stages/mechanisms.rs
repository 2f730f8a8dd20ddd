use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_security::{AuthMechanism, Exchange, PluginRegistry};

use crate::adapter::MechanismChainAdapter;
use crate::chain::{PipelineError, SecurityStage};

/// Registers the adapted mechanisms on the request's security context,
/// in registration order. The terminal barrier later runs them.
pub struct MechanismRegistrationStage {
    adapted: Vec<Arc<dyn AuthMechanism>>,
}

impl MechanismRegistrationStage {
    #[must_use]
    pub fn new(registry: &PluginRegistry) -> Self {
        let adapted = registry
            .mechanisms()
            .iter()
            .map(|m| Arc::new(MechanismChainAdapter::new(m.clone())) as Arc<dyn AuthMechanism>)
            .collect();
        Self { adapted }
    }
}

#[async_trait]
impl SecurityStage for MechanismRegistrationStage {
    fn name(&self) -> &str {
        "mechanism-registration"
    }

    async fn handle(&self, exchange: &mut Exchange) -> Result<(), PipelineError> {
        exchange
            .security_mut()
            .register_mechanisms(self.adapted.clone());
        Ok(())
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_security::{Exchange, InterceptPoint, MechanismError, PluginRegistry};

/// Fatal pipeline failure. Mechanism-internal errors surface here; the
/// transport bridge maps them to a 500 without leaking details.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Mechanism(#[from] MechanismError),
}

/// One link of the per-request security chain.
///
/// A stage either lets the exchange through unchanged, enriches it
/// (security context, response headers), or terminates it by setting a
/// status and calling [`Exchange::end`]. The chain checks completion
/// at every boundary, so a stage never sees an exchange a previous
/// stage already terminated.
#[async_trait]
pub trait SecurityStage: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, exchange: &mut Exchange) -> Result<(), PipelineError>;
}

/// The protected endpoint at the end of a chain. Runs only when every
/// stage let the exchange through.
#[async_trait]
pub trait TerminalHandler: Send + Sync {
    async fn handle(&self, exchange: &mut Exchange);
}

/// An ordered chain of stages ending in an optional terminal handler.
///
/// `run` executes before-auth interceptors, then the stages in order,
/// then after-auth interceptors, then the terminal. Completion is
/// re-checked after every participant; once a stage has ended the
/// exchange nothing further runs.
pub struct SecurityChain {
    registry: Arc<PluginRegistry>,
    stages: Vec<Arc<dyn SecurityStage>>,
    terminal: Option<Arc<dyn TerminalHandler>>,
}

impl SecurityChain {
    #[must_use]
    pub fn new(
        registry: Arc<PluginRegistry>,
        stages: Vec<Arc<dyn SecurityStage>>,
        terminal: Option<Arc<dyn TerminalHandler>>,
    ) -> Self {
        Self {
            registry,
            stages,
            terminal,
        }
    }

    /// Drive the exchange through the chain.
    ///
    /// # Errors
    /// Propagates the first fatal stage error. The caller owns the
    /// mapping to a transport-level response.
    pub async fn run(&self, exchange: &mut Exchange) -> Result<(), PipelineError> {
        for interceptor in self.registry.interceptors_at(InterceptPoint::BeforeAuth) {
            interceptor.handle(exchange).await;
            if exchange.is_complete() {
                return Ok(());
            }
        }

        for stage in &self.stages {
            let span = tracing::trace_span!("security_stage", stage = stage.name());
            let _guard = span.enter();
            stage.handle(exchange).await?;
            if exchange.is_complete() {
                tracing::debug!(
                    stage = stage.name(),
                    status = ?exchange.response_status(),
                    "exchange terminated"
                );
                return Ok(());
            }
        }

        for interceptor in self.registry.interceptors_at(InterceptPoint::AfterAuth) {
            interceptor.handle(exchange).await;
            if exchange.is_complete() {
                return Ok(());
            }
        }

        if let Some(terminal) = &self.terminal {
            terminal.handle(exchange).await;
        }
        Ok(())
    }
}

use crate::stages::{
    AuthRequiredConstraintStage, AuthenticationCallStage, AuthorizationStage,
    MechanismRegistrationStage, TokenInjectionStage,
};

/// The five stage objects, built once at startup and shared across
/// every per-resource chain.
pub struct SecurityChainComponents {
    registry: Arc<PluginRegistry>,
    registration: Arc<MechanismRegistrationStage>,
    constraint: Arc<AuthRequiredConstraintStage>,
    call: Arc<AuthenticationCallStage>,
    token: Arc<TokenInjectionStage>,
    authorization: Arc<AuthorizationStage>,
}

impl SecurityChainComponents {
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registration: Arc::new(MechanismRegistrationStage::new(&registry)),
            constraint: Arc::new(AuthRequiredConstraintStage::new(registry.clone())),
            call: Arc::new(AuthenticationCallStage::new(registry.clone())),
            token: Arc::new(TokenInjectionStage::new(&registry)),
            authorization: Arc::new(AuthorizationStage::new(registry.clone())),
            registry,
        }
    }

    /// Stage linkage for a protected resource, derived from what is
    /// actually configured:
    /// - mechanisms present: the full five-stage chain;
    /// - authorizers only: authorization alone (everything is
    ///   anonymous, so the authentication stages would be no-ops);
    /// - neither: no security stages at all.
    #[must_use]
    pub fn stages(&self) -> Vec<Arc<dyn SecurityStage>> {
        if self.registry.mechanisms().is_empty() {
            if self.registry.authorizers().is_empty() {
                Vec::new()
            } else {
                vec![self.authorization.clone()]
            }
        } else {
            vec![
                self.registration.clone(),
                self.constraint.clone(),
                self.call.clone(),
                self.token.clone(),
                self.authorization.clone(),
            ]
        }
    }

    #[must_use]
    pub fn chain_for(&self, terminal: Arc<dyn TerminalHandler>) -> SecurityChain {
        SecurityChain::new(self.registry.clone(), self.stages(), Some(terminal))
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }
}

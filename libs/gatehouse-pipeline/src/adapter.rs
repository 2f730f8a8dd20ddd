use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use gatehouse_security::{AuthMechanism, AuthOutcome, Exchange, MechanismError};

/// Wraps one configured [`AuthMechanism`] for use in the multi-mechanism
/// chain.
///
/// The chain runner stops at the first decisive outcome, and a plain
/// `NotAuthenticated` would be decisive: it would challenge immediately
/// and never give the next mechanism a chance. This adapter remaps
/// `NotAuthenticated` to `NotAttempted` so that one mechanism's
/// failure never blocks a different mechanism from succeeding. A true
/// `Authenticated` or `NotAttempted` passes through untouched, and an
/// internal mechanism error propagates unchanged, which is fatal for
/// the request.
///
/// `send_challenge` delegates without remapping; challenges are
/// additive and every mechanism may contribute headers.
pub struct MechanismChainAdapter {
    inner: Arc<dyn AuthMechanism>,
}

impl MechanismChainAdapter {
    #[must_use]
    pub fn new(inner: Arc<dyn AuthMechanism>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AuthMechanism for MechanismChainAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn authenticate(&self, exchange: &mut Exchange) -> Result<AuthOutcome, MechanismError> {
        let started = Instant::now();
        let result = self.inner.authenticate(exchange).await;
        let elapsed_ms = started.elapsed().as_millis();

        match result {
            Ok(AuthOutcome::NotAuthenticated) => {
                tracing::debug!(
                    mechanism = self.inner.name(),
                    elapsed_ms,
                    "credentials rejected, letting the next mechanism try"
                );
                Ok(AuthOutcome::NotAttempted)
            }
            Ok(outcome) => {
                tracing::debug!(mechanism = self.inner.name(), elapsed_ms, ?outcome, "mechanism outcome");
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(
                    mechanism = self.inner.name(),
                    elapsed_ms,
                    error = %e,
                    "mechanism failed"
                );
                Err(e)
            }
        }
    }

    async fn send_challenge(&self, exchange: &mut Exchange) {
        self.inner.send_challenge(exchange).await;
    }
}

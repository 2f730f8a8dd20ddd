use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_security::{
    AuthMechanism, AuthOutcome, Credential, Exchange, MechanismError, TokenManager,
};

use crate::basic_credentials;

/// Verifies `Basic id:token` pairs against the token manager.
///
/// Register this ahead of [`BasicAuthMechanism`](crate::BasicAuthMechanism):
/// clients that keep presenting the token they were issued then skip
/// password verification entirely. A pair the token manager does not
/// recognize yields `NotAttempted`, never `NotAuthenticated`, because
/// the same header may well be a valid `id:password` pair for the
/// plain basic mechanism behind it.
pub struct TokenBasicAuthMechanism {
    token_manager: Arc<dyn TokenManager>,
}

impl TokenBasicAuthMechanism {
    #[must_use]
    pub fn new(token_manager: Arc<dyn TokenManager>) -> Self {
        Self { token_manager }
    }
}

#[async_trait]
impl AuthMechanism for TokenBasicAuthMechanism {
    fn name(&self) -> &str {
        "token-basic-auth"
    }

    async fn authenticate(&self, exchange: &mut Exchange) -> Result<AuthOutcome, MechanismError> {
        let Some((id, token)) = basic_credentials(exchange) else {
            return Ok(AuthOutcome::NotAttempted);
        };

        match self
            .token_manager
            .verify(&id, &Credential::token(token))
            .await
        {
            Ok(account) => {
                exchange
                    .security_mut()
                    .complete_authentication(account, self.name());
                Ok(AuthOutcome::Authenticated)
            }
            Err(e) => {
                tracing::trace!(id, error = %e, "no cached token for credentials");
                Ok(AuthOutcome::NotAttempted)
            }
        }
    }

    /// The plain basic mechanism owns the challenge; issuing a second
    /// one here would duplicate it.
    async fn send_challenge(&self, _exchange: &mut Exchange) {}
}

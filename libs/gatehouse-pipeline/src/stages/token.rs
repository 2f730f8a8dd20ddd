use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_security::{Exchange, PluginRegistry, TokenManager};

use crate::chain::{PipelineError, SecurityStage};

/// Injects the account's token headers into the response after a
/// successful authentication. With no token manager configured, or for
/// anonymous requests, this stage is a no-op.
pub struct TokenInjectionStage {
    token_manager: Option<Arc<dyn TokenManager>>,
}

impl TokenInjectionStage {
    #[must_use]
    pub fn new(registry: &PluginRegistry) -> Self {
        Self {
            token_manager: registry.token_manager().cloned(),
        }
    }
}

#[async_trait]
impl SecurityStage for TokenInjectionStage {
    fn name(&self) -> &str {
        "token-injection"
    }

    async fn handle(&self, exchange: &mut Exchange) -> Result<(), PipelineError> {
        let Some(manager) = &self.token_manager else {
            return Ok(());
        };
        let Some(account) = exchange.security().authenticated_account().cloned() else {
            return Ok(());
        };

        if let Some(token) = manager.get(&account).await {
            manager.inject_token_headers(exchange, &token);
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use gatehouse_security::token::AUTH_TOKEN_HEADER;
    use gatehouse_security::{
        Account, AuthError, Authenticator, Credential, Token, inject_token_headers,
    };
    use http::Method;
    use time::OffsetDateTime;

    struct FixedTokens;

    #[async_trait]
    impl Authenticator for FixedTokens {
        fn name(&self) -> &str {
            "fixed-tokens"
        }

        async fn verify(&self, _id: &str, _credential: &Credential) -> Result<Account, AuthError> {
            Err(AuthError::InvalidCredentials)
        }
    }

    #[async_trait]
    impl TokenManager for FixedTokens {
        async fn get(&self, _account: &Account) -> Option<Token> {
            Some(Token::new("tok-1", OffsetDateTime::now_utc()))
        }

        async fn invalidate(&self, _account: &Account) {}

        async fn update(&self, _account: &Account) {}

        fn inject_token_headers(&self, exchange: &mut Exchange, token: &Token) {
            inject_token_headers(exchange, token, "/tokens");
        }
    }

    #[tokio::test]
    async fn injects_for_authenticated_requests() {
        let registry = Arc::new(
            PluginRegistry::builder()
                .token_manager(Arc::new(FixedTokens))
                .build()
                .unwrap(),
        );
        let stage = TokenInjectionStage::new(&registry);

        let mut ex = Exchange::builder(Method::GET, "/coll").build();
        ex.security_mut()
            .complete_authentication(Account::new("alice", Vec::new()), "basic");
        stage.handle(&mut ex).await.unwrap();

        assert_eq!(
            ex.response_headers()
                .get(AUTH_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("tok-1")
        );
    }

    #[tokio::test]
    async fn skips_anonymous_requests() {
        let registry = Arc::new(
            PluginRegistry::builder()
                .token_manager(Arc::new(FixedTokens))
                .build()
                .unwrap(),
        );
        let stage = TokenInjectionStage::new(&registry);

        let mut ex = Exchange::builder(Method::GET, "/coll").build();
        stage.handle(&mut ex).await.unwrap();

        assert!(!ex.response_headers().contains_key(AUTH_TOKEN_HEADER));
    }

    #[tokio::test]
    async fn no_manager_is_a_noop() {
        let registry = Arc::new(PluginRegistry::builder().build().unwrap());
        let stage = TokenInjectionStage::new(&registry);

        let mut ex = Exchange::builder(Method::GET, "/coll").build();
        ex.security_mut()
            .complete_authentication(Account::new("alice", Vec::new()), "basic");
        stage.handle(&mut ex).await.unwrap();

        assert!(ex.response_headers().is_empty());
    }
}

use async_trait::async_trait;
use gatehouse_security::{Authorizer, AuthorizerKind, AuthzError, Exchange};

/// Allows every request.
///
/// Meant for development and for deployments where authentication is
/// wanted but authorization is delegated elsewhere; it can still be
/// configured to insist on authentication.
pub struct FullAllower {
    authentication_required: bool,
}

impl FullAllower {
    #[must_use]
    pub fn new(authentication_required: bool) -> Self {
        Self {
            authentication_required,
        }
    }
}

#[async_trait]
impl Authorizer for FullAllower {
    fn name(&self) -> &str {
        "full-allower"
    }

    fn kind(&self) -> AuthorizerKind {
        AuthorizerKind::Allower
    }

    async fn is_allowed(&self, _exchange: &Exchange) -> Result<bool, AuthzError> {
        Ok(true)
    }

    async fn is_authentication_required(&self, _exchange: &Exchange) -> bool {
        self.authentication_required
    }
}

use std::collections::HashSet;
use std::net::IpAddr;

use async_trait::async_trait;
use gatehouse_security::{Authorizer, AuthorizerKind, AuthzError, Exchange};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpBlocklistConfig {
    #[serde(default)]
    pub blocked: Vec<IpAddr>,
}

/// Denies requests originating from blocked client addresses.
///
/// Applies to anonymous and authenticated requests alike, so it never
/// requires authentication.
pub struct IpBlocklistVetoer {
    blocked: HashSet<IpAddr>,
}

impl IpBlocklistVetoer {
    #[must_use]
    pub fn new(config: IpBlocklistConfig) -> Self {
        Self {
            blocked: config.blocked.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Authorizer for IpBlocklistVetoer {
    fn name(&self) -> &str {
        "ip-blocklist"
    }

    fn kind(&self) -> AuthorizerKind {
        AuthorizerKind::Vetoer
    }

    async fn is_allowed(&self, exchange: &Exchange) -> Result<bool, AuthzError> {
        let blocked = self.blocked.contains(&exchange.client_addr());
        if blocked {
            tracing::debug!(client = %exchange.client_addr(), "client address is blocklisted");
        }
        Ok(!blocked)
    }

    async fn is_authentication_required(&self, _exchange: &Exchange) -> bool {
        false
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::Method;
    use std::net::Ipv4Addr;

    fn vetoer() -> IpBlocklistVetoer {
        IpBlocklistVetoer::new(IpBlocklistConfig {
            blocked: vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 66))],
        })
    }

    #[tokio::test]
    async fn blocked_address_is_vetoed() {
        let ex = Exchange::builder(Method::GET, "/coll")
            .client_addr(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 66)))
            .build();

        assert!(!vetoer().is_allowed(&ex).await.unwrap());
    }

    #[tokio::test]
    async fn other_addresses_pass() {
        let ex = Exchange::builder(Method::GET, "/coll")
            .client_addr(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)))
            .build();

        let vetoer = vetoer();
        assert!(vetoer.is_allowed(&ex).await.unwrap());
        assert!(!vetoer.is_authentication_required(&ex).await);
    }
}

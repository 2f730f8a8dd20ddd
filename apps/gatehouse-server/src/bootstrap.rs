use std::sync::Arc;

use anyhow::Context;
use gatehouse_authenticators::StaticRealmAuthenticator;
use gatehouse_authorizers::{
    FullAllower, IpBlocklistConfig, IpBlocklistVetoer, RequestPredicateAllower,
    RequestPredicatesConfig,
};
use gatehouse_mechanisms::{BasicAuthMechanism, TokenBasicAuthMechanism};
use gatehouse_security::{PluginRegistry, TokenManager};
use gatehouse_tokens::{RndTokenManager, RndTokenManagerConfig};

use crate::config::SecurityConfig;
use crate::interceptors::FailedAuthLogger;

/// Assemble the plugin registry from configuration.
///
/// Order matters and is fixed here: the token mechanism registers
/// ahead of basic auth so cached tokens short-circuit password
/// verification, and the IP blocklist vetoer registers ahead of the
/// allowers.
///
/// # Errors
/// Inconsistent sections (token mechanism without a token manager, bad
/// predicate rules) and the registry's own build check fail startup.
pub fn build_registry(config: &SecurityConfig) -> anyhow::Result<Arc<PluginRegistry>> {
    let mut builder = PluginRegistry::builder();

    let token_manager: Option<Arc<dyn TokenManager>> = if config.tokens.enabled {
        Some(Arc::new(RndTokenManager::new(RndTokenManagerConfig {
            ttl_minutes: config.tokens.ttl_minutes,
            srv_uri: config.tokens.srv_uri.clone(),
        })))
    } else {
        None
    };

    if config.token_basic.enabled {
        let manager = token_manager
            .clone()
            .context("token_basic requires the tokens section to be enabled")?;
        builder = builder.mechanism(Arc::new(TokenBasicAuthMechanism::new(manager)));
    }

    if config.basic.enabled {
        let realm = Arc::new(StaticRealmAuthenticator::new(config.static_realm.clone()));
        builder = builder.mechanism(Arc::new(BasicAuthMechanism::new(
            config.basic.realm.clone(),
            realm,
        )));
    }

    if config.authorizers.ip_blocklist.enabled {
        builder = builder.authorizer(Arc::new(IpBlocklistVetoer::new(IpBlocklistConfig {
            blocked: config.authorizers.ip_blocklist.blocked.clone(),
        })));
    }

    if config.authorizers.predicates.enabled {
        let allower = RequestPredicateAllower::new(RequestPredicatesConfig {
            rules: config.authorizers.predicates.rules.clone(),
        })
        .context("invalid predicate rules")?;
        builder = builder.authorizer(Arc::new(allower));
    }

    if config.authorizers.full.enabled {
        builder = builder.authorizer(Arc::new(FullAllower::new(
            config.authorizers.full.authentication_required,
        )));
    }

    if let Some(manager) = token_manager {
        builder = builder.token_manager(manager);
    }

    if config.log_failed_auth {
        builder = builder.interceptor(Arc::new(FailedAuthLogger));
    }

    let registry = builder.build().context("invalid security configuration")?;
    tracing::info!(
        mechanisms = registry.mechanisms().len(),
        authorizers = registry.authorizers().len(),
        token_manager = registry.token_manager().is_some(),
        "security plugins registered"
    );
    Ok(Arc::new(registry))
}

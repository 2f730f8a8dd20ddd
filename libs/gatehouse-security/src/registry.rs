use std::sync::Arc;

use crate::authorizer::{Authorizer, AuthorizerKind};
use crate::interceptor::{InterceptPoint, Interceptor};
use crate::mechanism::AuthMechanism;
use crate::token::TokenManager;

/// Registry build failure: the configuration would produce an unsafe
/// or unusable pipeline. The process must not start in this state.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(
        "authentication mechanisms are configured but no authorizer is; \
         refusing to start with an everything-allowed pipeline"
    )]
    NoAuthorizers,
}

/// The configured, ordered sets of security plugins.
///
/// Registration order is evaluation order for both mechanisms and
/// authorizers; the pipeline relies on it for its short-circuiting
/// guarantees. Built once at startup and shared read-only across all
/// request workers.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    mechanisms: Vec<Arc<dyn AuthMechanism>>,
    authorizers: Vec<Arc<dyn Authorizer>>,
    token_manager: Option<Arc<dyn TokenManager>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl PluginRegistry {
    #[must_use]
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::default()
    }

    #[must_use]
    pub fn mechanisms(&self) -> &[Arc<dyn AuthMechanism>] {
        &self.mechanisms
    }

    #[must_use]
    pub fn authorizers(&self) -> &[Arc<dyn Authorizer>] {
        &self.authorizers
    }

    /// Enabled vetoers, in registration order.
    pub fn vetoers(&self) -> impl Iterator<Item = &Arc<dyn Authorizer>> {
        self.authorizers
            .iter()
            .filter(|a| a.kind() == AuthorizerKind::Vetoer)
    }

    /// Enabled allowers, in registration order.
    pub fn allowers(&self) -> impl Iterator<Item = &Arc<dyn Authorizer>> {
        self.authorizers
            .iter()
            .filter(|a| a.kind() == AuthorizerKind::Allower)
    }

    #[must_use]
    pub fn token_manager(&self) -> Option<&Arc<dyn TokenManager>> {
        self.token_manager.as_ref()
    }

    /// Interceptors registered for the given point, in registration order.
    pub fn interceptors_at(&self, point: InterceptPoint) -> impl Iterator<Item = &Arc<dyn Interceptor>> {
        self.interceptors
            .iter()
            .filter(move |i| i.intercept_point() == point)
    }
}

/// Builds a [`PluginRegistry`] from the enabled plugins, preserving
/// registration order.
#[derive(Default)]
pub struct PluginRegistryBuilder {
    mechanisms: Vec<Arc<dyn AuthMechanism>>,
    authorizers: Vec<Arc<dyn Authorizer>>,
    token_manager: Option<Arc<dyn TokenManager>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl PluginRegistryBuilder {
    #[must_use]
    pub fn mechanism(mut self, mechanism: Arc<dyn AuthMechanism>) -> Self {
        self.mechanisms.push(mechanism);
        self
    }

    #[must_use]
    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizers.push(authorizer);
        self
    }

    #[must_use]
    pub fn token_manager(mut self, token_manager: Arc<dyn TokenManager>) -> Self {
        self.token_manager = Some(token_manager);
        self
    }

    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Validate and build the registry.
    ///
    /// # Errors
    /// [`RegistryError::NoAuthorizers`] when mechanisms are configured
    /// without any authorizer: without an allower everything would be
    /// denied anyway, and a misconfigured deployment must fail at
    /// startup rather than at the first request.
    pub fn build(self) -> Result<PluginRegistry, RegistryError> {
        if !self.mechanisms.is_empty() && self.authorizers.is_empty() {
            return Err(RegistryError::NoAuthorizers);
        }

        Ok(PluginRegistry {
            mechanisms: self.mechanisms,
            authorizers: self.authorizers,
            token_manager: self.token_manager,
            interceptors: self.interceptors,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::exchange::Exchange;
    use crate::mechanism::{AuthOutcome, MechanismError};
    use async_trait::async_trait;

    struct NullMechanism;

    #[async_trait]
    impl AuthMechanism for NullMechanism {
        fn name(&self) -> &str {
            "null"
        }

        async fn authenticate(
            &self,
            _exchange: &mut Exchange,
        ) -> Result<AuthOutcome, MechanismError> {
            Ok(AuthOutcome::NotAttempted)
        }

        async fn send_challenge(&self, _exchange: &mut Exchange) {}
    }

    struct NullAuthorizer(AuthorizerKind);

    #[async_trait]
    impl Authorizer for NullAuthorizer {
        fn name(&self) -> &str {
            "null"
        }

        fn kind(&self) -> AuthorizerKind {
            self.0
        }

        async fn is_allowed(&self, _exchange: &Exchange) -> Result<bool, crate::AuthzError> {
            Ok(true)
        }
    }

    #[test]
    fn mechanisms_without_authorizers_is_a_build_error() {
        let result = PluginRegistry::builder()
            .mechanism(Arc::new(NullMechanism))
            .build();

        assert!(matches!(result, Err(RegistryError::NoAuthorizers)));
    }

    #[test]
    fn empty_registry_builds() {
        assert!(PluginRegistry::builder().build().is_ok());
    }

    #[test]
    fn vetoers_and_allowers_are_partitioned_in_order() {
        let registry = PluginRegistry::builder()
            .authorizer(Arc::new(NullAuthorizer(AuthorizerKind::Allower)))
            .authorizer(Arc::new(NullAuthorizer(AuthorizerKind::Vetoer)))
            .authorizer(Arc::new(NullAuthorizer(AuthorizerKind::Allower)))
            .build()
            .unwrap();

        assert_eq!(registry.allowers().count(), 2);
        assert_eq!(registry.vetoers().count(), 1);
    }
}

use async_trait::async_trait;
use gatehouse_security::{Authorizer, AuthorizerKind, AuthzError, Exchange};
use http::Method;
use serde::Deserialize;

/// Pseudo-role matched by anonymous requests. A rule granted to this
/// role opens its paths without authentication.
pub const UNAUTHENTICATED_ROLE: &str = "$unauthenticated";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestPredicatesConfig {
    #[serde(default)]
    pub rules: Vec<PredicateRule>,
}

/// One ACL entry: the role it grants to, the methods it covers (empty
/// means all) and a path pattern (`/coll/{id}`, `/static/{*rest}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredicateRule {
    pub role: String,
    #[serde(default)]
    pub methods: Vec<String>,
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PredicateError {
    #[error("rule for role '{role}': invalid method '{method}'")]
    InvalidMethod { role: String, method: String },

    #[error("rule for role '{role}': invalid path pattern '{path}': {source}")]
    InvalidPath {
        role: String,
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}

struct CompiledRule {
    role: String,
    methods: Vec<Method>,
    paths: matchit::Router<()>,
}

impl CompiledRule {
    fn compile(rule: PredicateRule) -> Result<Self, PredicateError> {
        let methods = rule
            .methods
            .iter()
            .map(|m| {
                Method::try_from(m.to_ascii_uppercase().as_str()).map_err(|_| {
                    PredicateError::InvalidMethod {
                        role: rule.role.clone(),
                        method: m.clone(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut paths = matchit::Router::new();
        paths
            .insert(&rule.path, ())
            .map_err(|source| PredicateError::InvalidPath {
                role: rule.role.clone(),
                path: rule.path.clone(),
                source,
            })?;

        Ok(Self {
            role: rule.role,
            methods,
            paths,
        })
    }

    fn matches(&self, exchange: &Exchange) -> bool {
        (self.methods.is_empty() || self.methods.contains(exchange.method()))
            && self.paths.at(exchange.path()).is_ok()
    }
}

/// Role-based ACL over request method and path.
///
/// A request is allowed when any rule granted to one of the caller's
/// roles matches it; anonymous callers hold only the
/// [`UNAUTHENTICATED_ROLE`]. Authentication is required unless an
/// anonymous rule matches the request, so resources stay closed by
/// default.
pub struct RequestPredicateAllower {
    rules: Vec<CompiledRule>,
}

impl RequestPredicateAllower {
    /// Compile the configured rules.
    ///
    /// # Errors
    /// [`PredicateError`] for an unknown method name or a path pattern
    /// `matchit` rejects. A bad rule fails startup rather than being
    /// silently skipped.
    pub fn new(config: RequestPredicatesConfig) -> Result<Self, PredicateError> {
        let rules = config
            .rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    fn matching_rules<'a>(
        &'a self,
        exchange: &'a Exchange,
    ) -> impl Iterator<Item = &'a CompiledRule> {
        self.rules.iter().filter(|r| r.matches(exchange))
    }
}

#[async_trait]
impl Authorizer for RequestPredicateAllower {
    fn name(&self) -> &str {
        "request-predicates"
    }

    fn kind(&self) -> AuthorizerKind {
        AuthorizerKind::Allower
    }

    async fn is_allowed(&self, exchange: &Exchange) -> Result<bool, AuthzError> {
        let allowed = match exchange.security().authenticated_account() {
            Some(account) => self.matching_rules(exchange).any(|r| {
                r.role == UNAUTHENTICATED_ROLE || account.has_role(&r.role)
            }),
            None => self
                .matching_rules(exchange)
                .any(|r| r.role == UNAUTHENTICATED_ROLE),
        };
        Ok(allowed)
    }

    async fn is_authentication_required(&self, exchange: &Exchange) -> bool {
        !self
            .matching_rules(exchange)
            .any(|r| r.role == UNAUTHENTICATED_ROLE)
    }
}

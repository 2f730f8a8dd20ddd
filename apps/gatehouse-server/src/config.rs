use std::net::IpAddr;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use gatehouse_authenticators::StaticRealmConfig;
use gatehouse_authorizers::PredicateRule;
use serde::Deserialize;

/// Top-level server configuration, loaded from a YAML file with
/// `GATEHOUSE_`-prefixed environment overrides on top
/// (`GATEHOUSE_SERVER__PORT=9090`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// Load the configuration, with the file being optional: a missing
    /// path means defaults plus environment.
    ///
    /// # Errors
    /// Extraction fails on unknown fields or ill-typed values.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("GATEHOUSE_").split("__"))
            .extract()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SecurityConfig {
    pub basic: BasicAuthConfig,
    pub token_basic: TokenBasicConfig,
    pub static_realm: StaticRealmConfig,
    pub tokens: TokensConfig,
    pub authorizers: AuthorizersConfig,
    /// Log rejected authentication attempts at `warn`.
    pub log_failed_auth: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BasicAuthConfig {
    pub enabled: bool,
    pub realm: String,
}

impl Default for BasicAuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            realm: "gatehouse".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TokenBasicConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TokensConfig {
    pub enabled: bool,
    pub ttl_minutes: u64,
    pub srv_uri: String,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_minutes: 15,
            srv_uri: "/tokens".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthorizersConfig {
    pub full: FullAllowerConfig,
    pub predicates: PredicatesConfig,
    pub ip_blocklist: IpBlocklistSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FullAllowerConfig {
    pub enabled: bool,
    pub authentication_required: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PredicatesConfig {
    pub enabled: bool,
    pub rules: Vec<PredicateRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IpBlocklistSection {
    pub enabled: bool,
    pub blocked: Vec<IpAddr>,
}

use std::collections::BTreeSet;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use gatehouse_security::{
    Account, AuthError, Authenticator, Credential, Exchange, Token, TokenManager,
    inject_token_headers,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

const TOKEN_BYTES: usize = 24;

fn default_ttl_minutes() -> u64 {
    15
}

fn default_srv_uri() -> String {
    "/tokens".to_owned()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RndTokenManagerConfig {
    /// Sliding time-to-live; every successful use pushes the expiry out
    /// by this much again.
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
    /// URI advertised in the `Auth-Token-Location` header.
    #[serde(default = "default_srv_uri")]
    pub srv_uri: String,
}

impl Default for RndTokenManagerConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            srv_uri: default_srv_uri(),
        }
    }
}

struct CacheEntry {
    value: SecretString,
    valid_until: OffsetDateTime,
    roles: BTreeSet<String>,
}

/// In-memory manager of random reference tokens, one per principal.
///
/// Repeated [`get`](TokenManager::get) calls within the TTL return the
/// same token with a refreshed expiry. [`update`](TokenManager::update)
/// swaps the cached roles in place so clients keep their token across
/// a role change.
pub struct RndTokenManager {
    cache: DashMap<String, CacheEntry>,
    ttl: Duration,
    srv_uri: String,
}

impl RndTokenManager {
    #[must_use]
    pub fn new(config: RndTokenManagerConfig) -> Self {
        Self {
            cache: DashMap::new(),
            ttl: Duration::minutes(i64::try_from(config.ttl_minutes).unwrap_or(i64::MAX)),
            srv_uri: config.srv_uri,
        }
    }

    fn mint_value() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[async_trait]
impl Authenticator for RndTokenManager {
    fn name(&self) -> &str {
        "rnd-token-manager"
    }

    async fn verify(&self, id: &str, credential: &Credential) -> Result<Account, AuthError> {
        let Credential::Token(presented) = credential else {
            return Err(AuthError::UnsupportedCredential);
        };
        let now = OffsetDateTime::now_utc();

        {
            let Some(mut entry) = self.cache.get_mut(id) else {
                return Err(AuthError::InvalidCredentials);
            };
            if now < entry.valid_until {
                if entry.value.expose_secret() != presented.expose_secret() {
                    return Err(AuthError::InvalidCredentials);
                }
                entry.valid_until = now + self.ttl;
                return Ok(Account::new(id, entry.roles.iter().cloned()));
            }
        }

        // Expired entry; the guard is released before removal.
        self.cache.remove(id);
        Err(AuthError::InvalidCredentials)
    }
}

#[async_trait]
impl TokenManager for RndTokenManager {
    async fn get(&self, account: &Account) -> Option<Token> {
        let now = OffsetDateTime::now_utc();
        let mut entry = self
            .cache
            .entry(account.principal().to_owned())
            .or_insert_with(|| CacheEntry {
                value: SecretString::from(Self::mint_value()),
                valid_until: now + self.ttl,
                roles: account.roles().clone(),
            });

        if now >= entry.valid_until {
            entry.value = SecretString::from(Self::mint_value());
            entry.roles = account.roles().clone();
        }
        entry.valid_until = now + self.ttl;

        Some(Token::new(entry.value.expose_secret(), entry.valid_until))
    }

    async fn invalidate(&self, account: &Account) {
        self.cache.remove(account.principal());
    }

    async fn update(&self, account: &Account) {
        if let Some(mut entry) = self.cache.get_mut(account.principal()) {
            entry.roles = account.roles().clone();
        }
    }

    fn inject_token_headers(&self, exchange: &mut Exchange, token: &Token) {
        inject_token_headers(exchange, token, &self.srv_uri);
    }
}

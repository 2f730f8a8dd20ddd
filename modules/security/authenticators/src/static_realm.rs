use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use gatehouse_security::{Account, AuthError, Authenticator, Credential};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Configuration for the static realm: the full user table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticRealmConfig {
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEntry {
    pub id: String,
    pub password: SecretString,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

struct Entry {
    password: SecretString,
    roles: BTreeSet<String>,
}

/// Verifies password credentials against an in-memory user table.
///
/// Lookups never reveal whether the id or the password was wrong; both
/// cases are `InvalidCredentials`.
pub struct StaticRealmAuthenticator {
    users: HashMap<String, Entry>,
}

impl StaticRealmAuthenticator {
    #[must_use]
    pub fn new(config: StaticRealmConfig) -> Self {
        let users = config
            .users
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    Entry {
                        password: u.password,
                        roles: u.roles,
                    },
                )
            })
            .collect();
        Self { users }
    }
}

#[async_trait]
impl Authenticator for StaticRealmAuthenticator {
    fn name(&self) -> &str {
        "static-realm"
    }

    async fn verify(&self, id: &str, credential: &Credential) -> Result<Account, AuthError> {
        let Credential::Password { id: cred_id, secret } = credential else {
            return Err(AuthError::UnsupportedCredential);
        };
        if cred_id != id {
            return Err(AuthError::InvalidCredentials);
        }

        let entry = self.users.get(id).ok_or(AuthError::InvalidCredentials)?;
        if entry.password.expose_secret() != secret.expose_secret() {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Account::new(id, entry.roles.iter().cloned()))
    }

    /// Refresh an account against the current table, picking up role
    /// changes without re-presenting the password.
    async fn verify_account(&self, account: &Account) -> Result<Account, AuthError> {
        let entry = self
            .users
            .get(account.principal())
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(Account::new(account.principal(), entry.roles.iter().cloned()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn realm() -> StaticRealmAuthenticator {
        let config: StaticRealmConfig = serde_json::from_value(serde_json::json!({
            "users": [
                { "id": "alice", "password": "secret", "roles": ["admin", "user"] },
                { "id": "bob", "password": "hunter2" }
            ]
        }))
        .unwrap();
        StaticRealmAuthenticator::new(config)
    }

    #[tokio::test]
    async fn valid_password_yields_account_with_roles() {
        let account = realm()
            .verify("alice", &Credential::password("alice", "secret"))
            .await
            .unwrap();

        assert_eq!(account.principal(), "alice");
        assert!(account.has_role("admin"));
        assert!(account.has_role("user"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let realm = realm();

        let wrong = realm
            .verify("alice", &Credential::password("alice", "nope"))
            .await;
        let unknown = realm
            .verify("eve", &Credential::password("eve", "nope"))
            .await;

        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn token_credential_is_unsupported() {
        let result = realm().verify("alice", &Credential::token("tok")).await;
        assert!(matches!(result, Err(AuthError::UnsupportedCredential)));
    }

    #[tokio::test]
    async fn verify_account_refreshes_roles() {
        let refreshed = realm()
            .verify_account(&Account::new("bob", vec!["stale".to_owned()]))
            .await
            .unwrap();

        assert!(!refreshed.has_role("stale"));
        assert!(refreshed.roles().is_empty());
    }
}

use async_trait::async_trait;

use crate::account::Account;
use crate::credential::Credential;

/// Verification failure.
///
/// `InvalidCredentials` is the soft failure a mechanism maps to
/// [`AuthOutcome::NotAuthenticated`](crate::AuthOutcome); every other
/// variant is treated as an internal fault.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("credential form not supported by this authenticator")]
    UnsupportedCredential,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Verifies a credential and produces an [`Account`].
///
/// The three verification forms mirror the ways credentials arrive:
/// with an explicit id (basic auth), as an already-built account
/// (token refresh), or self-contained (bearer tokens, certificates).
/// Implementations override the forms they support; the defaults
/// report [`AuthError::UnsupportedCredential`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    fn name(&self) -> &str;

    /// Verify a credential presented for the given id.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] when the credential does not
    /// verify; other variants for internal faults.
    async fn verify(&self, id: &str, credential: &Credential) -> Result<Account, AuthError>;

    /// Re-verify an existing account, returning a fresh one.
    ///
    /// # Errors
    /// [`AuthError::UnsupportedCredential`] unless overridden.
    async fn verify_account(&self, _account: &Account) -> Result<Account, AuthError> {
        Err(AuthError::UnsupportedCredential)
    }

    /// Verify a self-contained credential that encodes its own identity.
    ///
    /// # Errors
    /// [`AuthError::UnsupportedCredential`] unless overridden.
    async fn verify_credential(&self, _credential: &Credential) -> Result<Account, AuthError> {
        Err(AuthError::UnsupportedCredential)
    }
}

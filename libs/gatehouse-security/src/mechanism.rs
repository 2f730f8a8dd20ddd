use async_trait::async_trait;

use crate::exchange::Exchange;

/// Result of one mechanism examining one request.
///
/// Deliberately a tri-state, not a boolean: `NotAttempted` means "this
/// mechanism does not apply to this request, try the next one", while
/// `NotAuthenticated` means "this mechanism applies but the credential
/// was invalid". The chain adapter in `gatehouse-pipeline` relies on
/// the distinction to keep one mechanism's failure from blocking its
/// siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    NotAuthenticated,
    NotAttempted,
}

/// Internal mechanism failure. Fatal to the request: the pipeline
/// propagates it to the outer error boundary rather than challenging.
#[derive(Debug, thiserror::Error)]
pub enum MechanismError {
    #[error("mechanism '{mechanism}' failed: {reason}")]
    Internal { mechanism: String, reason: String },
}

/// An authentication mechanism examines a request for a
/// mechanism-specific credential, delegates verification to an
/// [`Authenticator`](crate::Authenticator), and reports an
/// [`AuthOutcome`].
///
/// On `Authenticated` the mechanism must have attached the verified
/// account to the exchange's security context via
/// [`SecurityContext::complete_authentication`](crate::SecurityContext::complete_authentication).
///
/// `send_challenge` adds the mechanism's challenge headers to the
/// response. Challenges are additive: when authentication fails, every
/// registered mechanism gets to contribute its challenge.
#[async_trait]
pub trait AuthMechanism: Send + Sync {
    fn name(&self) -> &str;

    /// Examine the request and attempt authentication.
    ///
    /// # Errors
    /// An error is an internal mechanism failure and fails the whole
    /// request; invalid credentials are reported as
    /// [`AuthOutcome::NotAuthenticated`], not as an error.
    async fn authenticate(&self, exchange: &mut Exchange) -> Result<AuthOutcome, MechanismError>;

    async fn send_challenge(&self, exchange: &mut Exchange);
}

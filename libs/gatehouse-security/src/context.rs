use std::sync::Arc;

use crate::account::Account;
use crate::mechanism::AuthMechanism;

/// Per-request security state.
///
/// A fresh `SecurityContext` is attached to the [`Exchange`](crate::Exchange)
/// at the start of the security chain and never shared across requests.
/// It records the mechanisms registered for the request, the account a
/// mechanism attached on success, and whether the enabled allowers
/// agreed that authentication is a hard requirement for this request.
#[derive(Default)]
pub struct SecurityContext {
    mechanisms: Vec<Arc<dyn AuthMechanism>>,
    account: Option<Account>,
    authenticated_by: Option<String>,
    auth_required: bool,
}

impl SecurityContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the ordered mechanisms that may authenticate this request.
    /// Registration order is evaluation order.
    pub fn register_mechanisms(&mut self, mechanisms: Vec<Arc<dyn AuthMechanism>>) {
        self.mechanisms = mechanisms;
    }

    /// The mechanisms registered for this request, in evaluation order.
    #[must_use]
    pub fn mechanisms(&self) -> Vec<Arc<dyn AuthMechanism>> {
        self.mechanisms.clone()
    }

    /// Record a completed authentication. Called by a mechanism as a
    /// side effect of returning [`AuthOutcome::Authenticated`](crate::AuthOutcome).
    pub fn complete_authentication(&mut self, account: Account, mechanism: &str) {
        self.account = Some(account);
        self.authenticated_by = Some(mechanism.to_owned());
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.account.is_some()
    }

    #[must_use]
    pub fn authenticated_account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    /// Name of the mechanism that authenticated the request, if any.
    #[must_use]
    pub fn authenticated_by(&self) -> Option<&str> {
        self.authenticated_by.as_deref()
    }

    pub fn set_authentication_required(&mut self, required: bool) {
        self.auth_required = required;
    }

    #[must_use]
    pub fn is_authentication_required(&self) -> bool {
        self.auth_required
    }
}

impl std::fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityContext")
            .field("mechanisms", &self.mechanisms.len())
            .field("account", &self.account)
            .field("authenticated_by", &self.authenticated_by)
            .field("auth_required", &self.auth_required)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_anonymous() {
        let ctx = SecurityContext::new();

        assert!(!ctx.is_authenticated());
        assert!(ctx.authenticated_account().is_none());
        assert!(!ctx.is_authentication_required());
    }

    #[test]
    fn complete_authentication_attaches_account() {
        let mut ctx = SecurityContext::new();
        ctx.complete_authentication(Account::new("alice", ["admin".to_owned()]), "basic");

        assert!(ctx.is_authenticated());
        assert_eq!(ctx.authenticated_account().unwrap().principal(), "alice");
        assert_eq!(ctx.authenticated_by(), Some("basic"));
    }
}

use std::collections::BTreeSet;

/// Identity produced by a successful authentication.
///
/// An `Account` is a principal name plus an unordered set of role
/// strings. It is created by an [`Authenticator`](crate::Authenticator)
/// when a credential verifies, attached to the request's
/// [`SecurityContext`](crate::SecurityContext), and dropped at the end
/// of the request. A fresh verification or token refresh always builds
/// a new `Account`; instances are never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Account {
    principal: String,
    roles: BTreeSet<String>,
}

impl Account {
    /// Create an account for `principal` with the given roles.
    pub fn new(principal: impl Into<String>, roles: impl IntoIterator<Item = String>) -> Self {
        Self {
            principal: principal.into(),
            roles: roles.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn roles_are_deduplicated_and_unordered() {
        let account = Account::new(
            "alice",
            ["admin".to_owned(), "user".to_owned(), "admin".to_owned()],
        );

        assert_eq!(account.principal(), "alice");
        assert_eq!(account.roles().len(), 2);
        assert!(account.has_role("admin"));
        assert!(account.has_role("user"));
        assert!(!account.has_role("root"));
    }

    #[test]
    fn accounts_with_same_principal_and_roles_are_equal() {
        let a = Account::new("bob", ["x".to_owned(), "y".to_owned()]);
        let b = Account::new("bob", ["y".to_owned(), "x".to_owned()]);

        assert_eq!(a, b);
    }
}

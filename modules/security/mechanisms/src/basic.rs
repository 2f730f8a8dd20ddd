use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_security::{
    AuthError, AuthMechanism, AuthOutcome, Authenticator, Credential, Exchange, MechanismError,
};
use http::HeaderValue;
use http::header::WWW_AUTHENTICATE;

use crate::basic_credentials;

/// Request header suppressing the `WWW-Authenticate` challenge.
pub const NO_AUTH_CHALLENGE_HEADER: &str = "No-Auth-Challenge";
/// Query parameter with the same effect as [`NO_AUTH_CHALLENGE_HEADER`].
pub const NO_AUTH_CHALLENGE_QUERY_PARAM: &str = "noauthchallenge";

/// HTTP Basic authentication against a pluggable authenticator.
///
/// The challenge is silent when the client asks for it via the
/// `No-Auth-Challenge` header or the `noauthchallenge` query param:
/// the 401 still goes out, but without `WWW-Authenticate`, so browser
/// XHR clients are spared the native credentials popup.
pub struct BasicAuthMechanism {
    realm: String,
    authenticator: Arc<dyn Authenticator>,
}

impl BasicAuthMechanism {
    #[must_use]
    pub fn new(realm: impl Into<String>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            realm: realm.into(),
            authenticator,
        }
    }

    fn challenge_suppressed(exchange: &Exchange) -> bool {
        exchange.header(NO_AUTH_CHALLENGE_HEADER).is_some()
            || exchange.query_param(NO_AUTH_CHALLENGE_QUERY_PARAM).is_some()
    }
}

#[async_trait]
impl AuthMechanism for BasicAuthMechanism {
    fn name(&self) -> &str {
        "basic-auth"
    }

    async fn authenticate(&self, exchange: &mut Exchange) -> Result<AuthOutcome, MechanismError> {
        let Some((id, password)) = basic_credentials(exchange) else {
            return Ok(AuthOutcome::NotAttempted);
        };

        let credential = Credential::password(id.clone(), password);
        match self.authenticator.verify(&id, &credential).await {
            Ok(account) => {
                exchange
                    .security_mut()
                    .complete_authentication(account, self.name());
                Ok(AuthOutcome::Authenticated)
            }
            Err(AuthError::InvalidCredentials | AuthError::UnsupportedCredential) => {
                tracing::debug!(id, "basic credentials rejected");
                Ok(AuthOutcome::NotAuthenticated)
            }
            Err(e) => Err(MechanismError::Internal {
                mechanism: self.name().to_owned(),
                reason: e.to_string(),
            }),
        }
    }

    async fn send_challenge(&self, exchange: &mut Exchange) {
        if Self::challenge_suppressed(exchange) {
            return;
        }
        let challenge = format!("Basic realm=\"{}\"", self.realm);
        if let Ok(value) = HeaderValue::try_from(challenge) {
            exchange.append_response_header(WWW_AUTHENTICATE, value);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::Method;
    use http::header::AUTHORIZATION;
    use secrecy::ExposeSecret;

    struct OnlyAlice;

    #[async_trait]
    impl Authenticator for OnlyAlice {
        fn name(&self) -> &str {
            "only-alice"
        }

        async fn verify(&self, id: &str, credential: &Credential) -> Result<Account, AuthError> {
            let Credential::Password { secret, .. } = credential else {
                return Err(AuthError::UnsupportedCredential);
            };
            if id == "alice" && secret.expose_secret() == "secret" {
                Ok(Account::new("alice", vec!["admin".to_owned()]))
            } else {
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    use gatehouse_security::Account;

    fn mechanism() -> BasicAuthMechanism {
        BasicAuthMechanism::new("gatehouse", Arc::new(OnlyAlice))
    }

    fn exchange(auth: Option<&str>) -> Exchange {
        let mut builder = Exchange::builder(Method::GET, "/coll");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        builder.build()
    }

    #[tokio::test]
    async fn valid_credentials_authenticate() {
        // alice:secret
        let mut ex = exchange(Some("Basic YWxpY2U6c2VjcmV0"));
        let outcome = mechanism().authenticate(&mut ex).await.unwrap();

        assert_eq!(outcome, AuthOutcome::Authenticated);
        assert_eq!(
            ex.security().authenticated_account().unwrap().principal(),
            "alice"
        );
        assert_eq!(ex.security().authenticated_by(), Some("basic-auth"));
    }

    #[tokio::test]
    async fn wrong_password_is_not_authenticated() {
        // alice:wrong
        let mut ex = exchange(Some("Basic YWxpY2U6d3Jvbmc="));
        let outcome = mechanism().authenticate(&mut ex).await.unwrap();

        assert_eq!(outcome, AuthOutcome::NotAuthenticated);
        assert!(!ex.security().is_authenticated());
    }

    #[tokio::test]
    async fn missing_header_is_not_attempted() {
        let mut ex = exchange(None);
        let outcome = mechanism().authenticate(&mut ex).await.unwrap();

        assert_eq!(outcome, AuthOutcome::NotAttempted);
    }

    #[tokio::test]
    async fn challenge_names_the_realm() {
        let mut ex = exchange(None);
        mechanism().send_challenge(&mut ex).await;

        assert_eq!(
            ex.response_headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Basic realm=\"gatehouse\"")
        );
    }

    #[tokio::test]
    async fn challenge_header_suppresses_www_authenticate() {
        let mut ex = Exchange::builder(Method::GET, "/coll")
            .header(
                http::HeaderName::from_static("no-auth-challenge"),
                HeaderValue::from_static("true"),
            )
            .build();
        mechanism().send_challenge(&mut ex).await;

        assert!(!ex.response_headers().contains_key(WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn challenge_query_param_suppresses_www_authenticate() {
        let mut ex = Exchange::builder(Method::GET, "/coll")
            .query_string("noauthchallenge")
            .build();
        mechanism().send_challenge(&mut ex).await;

        assert!(!ex.response_headers().contains_key(WWW_AUTHENTICATE));
    }
}

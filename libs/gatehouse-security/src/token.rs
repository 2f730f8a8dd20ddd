use async_trait::async_trait;
use http::header::ACCESS_CONTROL_EXPOSE_HEADERS;
use http::{HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::account::Account;
use crate::authenticator::Authenticator;
use crate::exchange::Exchange;

/// Response header carrying the token value.
pub const AUTH_TOKEN_HEADER: &str = "Auth-Token";
/// Response header carrying the token expiration timestamp.
pub const AUTH_TOKEN_VALID_HEADER: &str = "Auth-Token-Valid-Until";
/// Response header carrying the URI the token can be used against.
pub const AUTH_TOKEN_LOCATION_HEADER: &str = "Auth-Token-Location";

/// An opaque credential standing in for a prior successful
/// authentication, with an expiry understood by the issuing
/// [`TokenManager`].
#[derive(Clone)]
pub struct Token {
    value: SecretString,
    valid_until: OffsetDateTime,
}

impl Token {
    #[must_use]
    pub fn new(value: impl Into<String>, valid_until: OffsetDateTime) -> Self {
        Self {
            value: SecretString::from(value.into()),
            valid_until,
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        self.value.expose_secret()
    }

    #[must_use]
    pub fn valid_until(&self) -> OffsetDateTime {
        self.valid_until
    }

    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.valid_until
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &"[REDACTED]")
            .field("valid_until", &self.valid_until)
            .finish()
    }
}

/// A specialized [`Authenticator`] owning the lifecycle of bearer
/// tokens issued for authenticated accounts.
///
/// Reference tokens (server-side cache) and self-contained tokens are
/// both legal implementations; the pipeline only relies on this
/// contract.
#[async_trait]
pub trait TokenManager: Authenticator {
    /// Return the account's valid token, minting one if needed.
    ///
    /// Repeated calls within the TTL may return the same token
    /// (reference case) or a fresh equivalent (self-contained case).
    /// A manager that cannot mint returns `None`; it never fails for
    /// accounts it does not recognize.
    async fn get(&self, account: &Account) -> Option<Token>;

    /// Revoke all tokens for the account. Safe to call when no token
    /// exists.
    async fn invalidate(&self, account: &Account);

    /// Refresh token contents after the account's roles or attributes
    /// changed, without forcing re-authentication.
    async fn update(&self, account: &Account);

    /// Write the token headers onto the response and expose them to
    /// browser clients via CORS.
    fn inject_token_headers(&self, exchange: &mut Exchange, token: &Token);
}

/// Default header injection used by token manager implementations:
/// writes `Auth-Token`, `Auth-Token-Valid-Until` (RFC 3339) and
/// `Auth-Token-Location`, and appends the three names to
/// `Access-Control-Expose-Headers`.
pub fn inject_token_headers(exchange: &mut Exchange, token: &Token, location: &str) {
    let headers = [
        (AUTH_TOKEN_HEADER, token.value().to_owned()),
        (
            AUTH_TOKEN_VALID_HEADER,
            token
                .valid_until()
                .format(&Rfc3339)
                .unwrap_or_else(|_| token.valid_until().to_string()),
        ),
        (AUTH_TOKEN_LOCATION_HEADER, location.to_owned()),
    ];

    for (name, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.as_str()),
        ) {
            exchange.response_headers_mut().insert(name, value);
        }
    }

    let exposed = format!("{AUTH_TOKEN_HEADER}, {AUTH_TOKEN_VALID_HEADER}, {AUTH_TOKEN_LOCATION_HEADER}");
    if let Ok(value) = HeaderValue::try_from(exposed) {
        exchange
            .response_headers_mut()
            .append(ACCESS_CONTROL_EXPOSE_HEADERS, value);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::Method;
    use time::Duration;

    #[test]
    fn token_debug_redacts_value() {
        let token = Token::new("s3cret", OffsetDateTime::UNIX_EPOCH);
        let out = format!("{token:?}");

        assert!(!out.contains("s3cret"));
    }

    #[test]
    fn expiry_check() {
        let now = OffsetDateTime::now_utc();
        let token = Token::new("t", now + Duration::minutes(15));

        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + Duration::minutes(16)));
    }

    #[test]
    fn injected_headers_are_cors_exposed() {
        let mut ex = Exchange::builder(Method::GET, "/coll").build();
        let token = Token::new("abc123", OffsetDateTime::now_utc());

        inject_token_headers(&mut ex, &token, "/tokens");

        assert_eq!(
            ex.response_headers()
                .get(AUTH_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("abc123")
        );
        assert_eq!(
            ex.response_headers()
                .get(AUTH_TOKEN_LOCATION_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("/tokens")
        );
        assert!(ex.response_headers().contains_key(AUTH_TOKEN_VALID_HEADER));

        let exposed = ex
            .response_headers()
            .get(ACCESS_CONTROL_EXPOSE_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(exposed.contains(AUTH_TOKEN_HEADER));
        assert!(exposed.contains(AUTH_TOKEN_VALID_HEADER));
        assert!(exposed.contains(AUTH_TOKEN_LOCATION_HEADER));
    }
}

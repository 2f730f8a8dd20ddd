#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authentication mechanism plugins.
//!
//! Both mechanisms consume the HTTP `Basic` authorization scheme:
//! [`BasicAuthMechanism`] verifies `id:password` pairs against a
//! configured [`Authenticator`](gatehouse_security::Authenticator),
//! and [`TokenBasicAuthMechanism`] verifies `id:token` pairs against
//! the token manager. Registering the token mechanism first lets a
//! cached token short-circuit password verification on every request
//! after the first.

mod basic;
mod token_basic;

pub use basic::{BasicAuthMechanism, NO_AUTH_CHALLENGE_HEADER, NO_AUTH_CHALLENGE_QUERY_PARAM};
pub use token_basic::TokenBasicAuthMechanism;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use gatehouse_security::Exchange;
use http::header::AUTHORIZATION;

/// Extract the `id:secret` pair from a `Basic` authorization header,
/// if the request carries a well-formed one.
fn basic_credentials(exchange: &Exchange) -> Option<(String, String)> {
    let header = exchange.header(AUTHORIZATION.as_str())?;
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    // The password may itself contain ':'; only the first one splits.
    let (id, secret) = text.split_once(':')?;
    Some((id.to_owned(), secret.to_owned()))
}

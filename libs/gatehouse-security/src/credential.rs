use secrecy::SecretString;

/// A credential extracted from an inbound request.
///
/// Credentials are ephemeral: a mechanism builds one from raw request
/// data (the `Authorization` header, cookies, the client certificate
/// chain) and hands it to an [`Authenticator`](crate::Authenticator)
/// for verification. Secret material is wrapped in [`SecretString`] so
/// `Debug` output redacts it.
#[derive(Debug, Clone)]
pub enum Credential {
    /// An id plus an opaque secret, as carried by HTTP Basic auth.
    Password { id: String, secret: SecretString },
    /// A digest verifier bound to a realm and algorithm.
    Digest {
        realm: String,
        algorithm: String,
        verifier: Vec<u8>,
    },
    /// A self-contained or reference token encoding identity.
    Token(SecretString),
    /// Identity derived from a verified client certificate.
    Certificate { subject_dn: String },
}

impl Credential {
    /// Build a password credential from id and plain secret.
    pub fn password(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::Password {
            id: id.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Build a token credential from an opaque token value.
    pub fn token(value: impl Into<String>) -> Self {
        Self::Token(SecretString::from(value.into()))
    }
}

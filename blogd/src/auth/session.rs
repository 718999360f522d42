//! JWT session token creation and verification.

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    api::models::users::Identity,
    config::Config,
    errors::Error,
    types::UserId,
};

/// JWT session claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,   // Subject (user ID)
    pub email: String, // User email
    pub name: String,  // Display name
    pub iat: i64,      // Issued at
    pub exp: i64,      // Expiration time
}

impl SessionClaims {
    fn new(identity: &Identity, issued_at: DateTime<Utc>, ttl: Duration) -> Result<Self, Error> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| Error::Internal {
            operation: format!("convert session ttl: {e}"),
        })?;

        Ok(Self {
            sub: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        })
    }
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Issues and verifies HS256 session tokens.
///
/// Keys are derived once from `secret_key` and never change for the life of the process. Rotating
/// the secret invalidates every outstanding token.
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl SessionTokens {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Build from configuration. A missing secret is a startup error.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret_key = config.secret_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| Error::Internal {
            operation: "create session tokens: secret_key is required".to_string(),
        })?;

        Ok(Self::new(secret_key.as_bytes(), config.auth.session.timeout))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a token for `identity`, valid from now for the configured TTL.
    pub fn issue(&self, identity: &Identity) -> Result<String, Error> {
        self.issue_at(identity, Utc::now())
    }

    fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> Result<String, Error> {
        let claims = SessionClaims::new(identity, issued_at, self.ttl)?;
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| Error::Internal {
            operation: format!("create JWT: {e}"),
        })
    }

    /// Verify a token's signature and expiry and return the identity it carries.
    ///
    /// Every failure is reported as `Unauthenticated`; the reason is only traced.
    pub fn verify(&self, token: &str) -> Result<Identity, Error> {
        let token_data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::trace!("Session token rejected: {:?}", e.kind());
            Error::Unauthenticated
        })?;

        Ok(Identity::from(token_data.claims))
    }
}

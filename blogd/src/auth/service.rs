//! Register, login and logout.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    api::models::{
        auth::{Credentials, Registration},
        users::Identity,
    },
    auth::{
        cookie::SessionCookie,
        password::{self, Argon2Params},
        session::SessionTokens,
    },
    config::Config,
    db::{
        handlers::{Repository, UserRepository},
        models::users::UserCreateDBRequest,
        store::Store,
    },
    errors::{Error, Result},
    types::abbrev_uuid,
};

/// Outcome of a successful register or login: who the caller is, and the `Set-Cookie` value that
/// carries their new session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub identity: Identity,
    pub cookie: String,
}

/// Credential checks and session issuance on top of the user store.
#[derive(Debug, Clone)]
pub struct AuthenticationService<S> {
    store: S,
    tokens: SessionTokens,
    cookie: SessionCookie,
    argon2: Argon2Params,
    /// Verified against when the email is unknown, so both login failures cost one Argon2 run
    dummy_hash: Arc<str>,
}

impl<S: Store> AuthenticationService<S> {
    pub fn new(store: S, tokens: SessionTokens, cookie: SessionCookie, argon2: Argon2Params) -> Result<Self> {
        let dummy_hash = password::hash_string_with_params("blogd-timing-equalizer", argon2)?;
        Ok(Self {
            store,
            tokens,
            cookie,
            argon2,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn from_config(store: S, config: &Config) -> Result<Self> {
        Self::new(
            store,
            SessionTokens::from_config(config)?,
            SessionCookie::from_config(config),
            config.auth.password.argon2_params(),
        )
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    fn start_session(&self, identity: Identity) -> Result<AuthSession> {
        let token = self.tokens.issue(&identity)?;
        Ok(AuthSession {
            cookie: self.cookie.attach(&token),
            identity,
        })
    }

    /// Create an account and start a session for it.
    ///
    /// Fails with `DuplicateEmail` if the email is taken, whether that is seen up front or only
    /// when the store's unique constraint fires on a concurrent registration.
    #[instrument(skip_all)]
    pub async fn register(&self, registration: Registration) -> Result<AuthSession> {
        let users = self.store.users();

        if users.get_user_by_email(&registration.email).await?.is_some() {
            debug!("Registration rejected: email already exists");
            return Err(Error::DuplicateEmail);
        }

        let password_hash = password::hash(registration.password, self.argon2).await?;

        let user = users
            .create(&UserCreateDBRequest {
                email: registration.email,
                name: registration.name,
                password_hash,
            })
            .await
            .map_err(|e| {
                if e.is_unique_violation_on("users") {
                    Error::DuplicateEmail
                } else {
                    Error::Database(e)
                }
            })?;

        info!(user_id = %abbrev_uuid(&user.id), "Registered new user");
        self.start_session(Identity::from(user))
    }

    /// Check credentials and start a session.
    ///
    /// An unknown email and a wrong password both fail with `InvalidCredentials`, after the same
    /// amount of hashing work.
    #[instrument(skip_all)]
    pub async fn login(&self, credentials: Credentials) -> Result<AuthSession> {
        let user = self.store.users().get_user_by_email(&credentials.email).await?;

        let hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };
        let valid = password::verify(credentials.password, hash).await?;

        match user {
            Some(user) if valid => {
                debug!(user_id = %abbrev_uuid(&user.id), "Login succeeded");
                self.start_session(Identity::from(user))
            }
            _ => {
                debug!("Login failed");
                Err(Error::InvalidCredentials)
            }
        }
    }

    /// `Set-Cookie` value that ends the caller's session in the browser.
    ///
    /// The token itself stays valid until it expires; there is no server-side revocation.
    #[instrument(skip_all, fields(user_id = %abbrev_uuid(&identity.id)))]
    pub fn logout(&self, identity: &Identity) -> String {
        debug!("Logging out");
        self.cookie.clear()
    }
}

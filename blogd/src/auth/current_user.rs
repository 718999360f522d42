//! Request authentication and the auth guard.
//!
//! [`MaybeIdentity`] is the non-blocking authenticator: it reads the session cookie, verifies the
//! token and yields `Some(identity)` or `None`. It never rejects a request. [`Identity`] as an
//! extractor is the guard: it runs the authenticator and turns `None` into a 401.
//!
//! Handlers declare which one they need in their signature, so the resolved identity is passed to
//! them explicitly rather than looked up from shared request state.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tracing::{instrument, trace};

use crate::{
    AppState,
    api::models::users::Identity,
    auth::{cookie::SessionCookie, session::SessionTokens},
    db::store::Store,
    errors::{Error, Result},
    types::abbrev_uuid,
};

/// The caller's identity if the request carries a valid session, otherwise `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaybeIdentity(pub Option<Identity>);

/// Resolve the identity carried by the session cookie in `headers`.
///
/// A missing cookie and an invalid, expired or tampered token all yield `None`. When the cookie
/// appears more than once, the first value that verifies wins.
pub fn authenticate(tokens: &SessionTokens, cookie: &SessionCookie, headers: &HeaderMap) -> Option<Identity> {
    let mut candidates = 0;
    for token in cookie.extract(headers) {
        candidates += 1;
        if let Ok(identity) = tokens.verify(token) {
            trace!(user_id = %abbrev_uuid(&identity.id), candidates, "Session cookie verified");
            return Some(identity);
        }
    }

    if candidates == 0 {
        trace!("No session cookie present");
    } else {
        trace!(candidates, "Session cookie present but not valid");
    }
    None
}

/// Admit only authenticated callers.
pub fn guard(identity: Option<Identity>) -> Result<Identity> {
    identity.ok_or(Error::Unauthenticated)
}

impl<S: Store> FromRequestParts<AppState<S>> for MaybeIdentity {
    type Rejection = Infallible;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> std::result::Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(authenticate(state.auth.tokens(), state.auth.cookie(), &parts.headers)))
    }
}

impl<S: Store> FromRequestParts<AppState<S>> for Identity {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self> {
        let MaybeIdentity(identity) = match MaybeIdentity::from_request_parts(parts, state).await {
            Ok(resolved) => resolved,
            Err(never) => match never {},
        };
        guard(identity)
    }
}

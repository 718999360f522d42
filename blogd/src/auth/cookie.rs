//! Session cookie transport.
//!
//! Binds a session token to a `Set-Cookie` header and reads it back from `Cookie`. No token
//! checking happens here.

use axum::http::{HeaderMap, header};

use crate::config::{Config, SameSite};

/// Attributes of the session cookie, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    max_age_secs: u64,
    secure: bool,
    same_site: SameSite,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, max_age_secs: u64, secure: bool, same_site: SameSite) -> Self {
        Self {
            name: name.into(),
            max_age_secs,
            secure,
            same_site,
        }
    }

    /// `Secure` is set only in production; Max-Age follows the session timeout.
    pub fn from_config(config: &Config) -> Self {
        let session = &config.auth.session;
        Self::new(
            session.cookie_name.clone(),
            session.timeout.as_secs(),
            config.environment.is_production(),
            session.cookie_same_site,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> String {
        let mut attributes = format!("Path=/; HttpOnly; SameSite={}", self.same_site);
        if self.secure {
            attributes.push_str("; Secure");
        }
        attributes
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn attach(&self, token: &str) -> String {
        format!("{}={}; {}; Max-Age={}", self.name, token, self.attributes(), self.max_age_secs)
    }

    /// `Set-Cookie` value that removes the cookie. Same attributes as [`attach`](Self::attach), so
    /// browsers match and drop it.
    pub fn clear(&self) -> String {
        format!(
            "{}=; {}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.name,
            self.attributes()
        )
    }

    /// Every value of the session cookie in request headers, in the order sent. Browsers send one
    /// per matching path or domain, so more than one can appear. Empty values are skipped.
    pub fn extract<'a>(&'a self, headers: &'a HeaderMap) -> impl Iterator<Item = &'a str> + 'a {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|cookie| cookie.trim().split_once('='))
            .filter(move |(name, _)| *name == self.name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }
}

//! Authentication and authorization.
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`session`]: signed, time-bounded session tokens
//! - [`cookie`]: carrying the token in an HttpOnly cookie
//! - [`service`]: register, login and logout
//! - [`current_user`]: per-request authentication and the guard for protected routes
//! - [`ownership`]: owner-only mutation of resources

pub mod cookie;
pub mod current_user;
pub mod ownership;
pub mod password;
pub mod service;
pub mod session;

//! Resource store: users and posts.
//!
//! Handlers never talk to a database directly. They go through a [`Store`], which hands out one
//! repository per resource kind. Two stores exist:
//!
//! - [`PgStore`]: PostgreSQL via sqlx, with migrations embedded from `migrations/`
//! - [`MemoryStore`]: process-local tables, for development and tests

pub mod errors;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod store;

pub use memory::MemoryStore;
pub use store::{PgStore, Store};

//! Owner-only mutation.

use std::fmt::Display;

use crate::{
    api::models::users::Identity,
    db::models::posts::PostDBResponse,
    errors::{Error, Result},
    types::{Operation, UserId, abbrev_uuid},
};

/// A resource with a single owning user.
pub trait Owned {
    /// Human readable kind, used in error messages ("post").
    const RESOURCE: &'static str;

    fn owner_id(&self) -> UserId;
}

impl Owned for PostDBResponse {
    const RESOURCE: &'static str = "post";

    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

/// Permit `action` only if the caller owns `resource`.
pub fn authorize<T: Owned>(identity: &Identity, resource: &T, action: Operation) -> Result<()> {
    if identity.id == resource.owner_id() {
        return Ok(());
    }

    tracing::info!(
        user_id = %abbrev_uuid(&identity.id),
        owner_id = %abbrev_uuid(&resource.owner_id()),
        "Refusing to {action} {} owned by another user",
        T::RESOURCE
    );
    Err(Error::Forbidden {
        action,
        resource: T::RESOURCE.to_string(),
    })
}

/// Existence first, then ownership: a missing resource is a 404 for everyone, an existing one
/// is a 403 for anyone but its owner.
pub fn authorize_existing<T: Owned>(identity: &Identity, found: Option<T>, id: impl Display, action: Operation) -> Result<T> {
    let resource = found.ok_or_else(|| Error::NotFound {
        resource: capitalize(T::RESOURCE),
        id: id.to_string(),
    })?;
    authorize(identity, &resource, action)?;
    Ok(resource)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

//! Application services enforcing the post lifecycle and building listings.

mod lifecycle;
mod listing;

#[cfg(test)]
pub(crate) mod fakes;

pub use lifecycle::{LifecycleConfig, PostLifecycleService};
pub use listing::{ListingConfig, PostListing};

use crate::domain::Identity;
use crate::error::DomainError;
use crate::ports::IdentityProvider;

fn require_identity(actor: &dyn IdentityProvider) -> Result<Identity, DomainError> {
    actor.current_identity().ok_or(DomainError::Unauthenticated)
}

fn require_admin(actor: &dyn IdentityProvider) -> Result<Identity, DomainError> {
    let identity = require_identity(actor)?;
    if !identity.is_admin() {
        tracing::warn!(actor_id = %identity.id, "Administrator role required");
        return Err(DomainError::Forbidden(
            "administrator role required".to_string(),
        ));
    }
    Ok(identity)
}

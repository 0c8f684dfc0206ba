//! Identity resolution port.

use crate::domain::Identity;

/// Supplies the actor on whose behalf an operation runs.
pub trait IdentityProvider: Send + Sync {
    /// The authenticated actor, or `None` for an anonymous caller.
    fn current_identity(&self) -> Option<Identity>;
}

impl IdentityProvider for Identity {
    fn current_identity(&self) -> Option<Identity> {
        Some(self.clone())
    }
}

impl IdentityProvider for Option<Identity> {
    fn current_identity(&self) -> Option<Identity> {
        self.clone()
    }
}

/// Provider for calls made without credentials.
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn current_identity(&self) -> Option<Identity> {
        None
    }
}

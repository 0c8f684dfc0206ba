//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod change_feed;
mod identity;
mod media;
mod repository;

pub use auth::{AuthError, TokenClaims, TokenService};
pub use change_feed::{ChangeFeed, ChangeHandler, FeedError, SubscriptionId};
pub use identity::{Anonymous, IdentityProvider};
pub use media::{MediaError, MediaFile, MediaStore};
pub use repository::{BaseRepository, PostFilter, PostQuery, PostRepository, SortOrder};

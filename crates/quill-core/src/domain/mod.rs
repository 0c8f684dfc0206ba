//! Domain entities - the core business objects.

mod change;
mod identity;
mod post;

pub use change::{ChangeKind, PostChange};
pub use identity::{Identity, Role};
pub use post::{
    DEFAULT_EXCERPT_LENGTH, NewPost, Post, PostChanges, PostPatch, VerificationState,
    derive_excerpt, normalize_tags,
};

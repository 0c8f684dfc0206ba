//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`.
//! This crate contains the post stores, change feeds, token validation and
//! media storage.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL post store via SeaORM
//! - `auth` - JWT bearer token validation
//! - `redis` - Redis-backed change feed shared across instances

pub mod change_feed;
pub mod database;
pub mod media;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use change_feed::InMemoryChangeFeed;
pub use database::InMemoryPostRepository;
pub use media::{LocalMediaStore, MediaConfig};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, DatabaseConnections, PostgresPostRepository};

#[cfg(feature = "redis")]
pub use change_feed::{RedisChangeFeed, RedisConfig};

//! # Quill Core
//!
//! The domain layer of Quill: posts, their publication and verification
//! lifecycle, and the read-side listings built on top of it.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, ErrorKind};
pub use services::{LifecycleConfig, ListingConfig, PostLifecycleService, PostListing};

//! HTTP middleware and extractors.
//!
//! # Modules
//!
//! - `auth` - Acting-user extractors

pub mod auth;

pub use auth::{ACTING_USER_HEADER, ActingUser, RequireUser};

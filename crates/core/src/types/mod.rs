//! Core types for Madziarynka.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod audit;
pub mod id;
pub mod status;

pub use audit::{AuditAction, AuditModule};
pub use id::*;
pub use status::*;

//! Madziarynka Core - domain types and pure algorithms.
//!
//! This crate provides the types shared by every Madziarynka component:
//! - `backoffice` - Order fulfillment, catalog and scheduling service
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access. Storage lives in the backoffice crate; the algorithms
//! here (BOM expansion, shift overlap) are deterministic and tested in
//! isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, statuses and audit codes
//! - [`order`] - Validated order line input
//! - [`bom`] - Bill-of-materials lines and consumption aggregation
//! - [`schedule`] - Shift time ranges and conflict detection
//! - [`error`] - Input validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bom;
pub mod error;
pub mod order;
pub mod schedule;
pub mod types;

pub use bom::{BomLine, BomLines, Consumption, consumption};
pub use error::ValidationError;
pub use order::{OrderLineInput, OrderLines};
pub use schedule::{Shift, TimeRange, conflicting_shift_ids, find_conflict};
pub use types::*;

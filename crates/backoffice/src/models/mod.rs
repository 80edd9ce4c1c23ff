//! Domain models for the back office.
//!
//! Row types derive `sqlx::FromRow` directly where every column maps onto a
//! core type; request inputs are validated into drafts before any storage
//! call.

pub mod audit;
pub mod catalog;
pub mod order;
pub mod shift;
pub mod user;

pub use audit::{LogEntry, NewLogEntry};
pub use catalog::{
    CreateIngredientInput, Ingredient, IngredientFields, IngredientView, Product, ProductBomEntry, ProductDetails,
    ProductDraft, ProductInput, RestockInput, UpdateIngredientInput,
};
pub use order::{CreateOrderInput, Order, OrderDetails, OrderItem, UpdateOrderInput};
pub use shift::{ConflictCheckInput, ConflictCheckResult, ScheduleOverview, ShiftInput};
pub use user::{NewUser, User};

pub use madziarynka_core::Shift;

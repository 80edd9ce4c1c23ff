//! Staff accounts.

use serde::{Deserialize, Serialize};

use madziarynka_core::{UserId, UserRole};

/// A staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
}

/// A staff member to create.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub role: UserRole,
}

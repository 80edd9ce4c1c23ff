//! Staff account commands.
//!
//! # Usage
//!
//! ```bash
//! mz-cli user create -n "Magda" -r admin
//! mz-cli user create -n "Ola"
//! ```
//!
//! PINs are managed by the authentication gateway, not here.

use madziarynka_backoffice::db::{PgStore, RepositoryError, Store, StoreTransaction};
use madziarynka_backoffice::models::NewUser;
use madziarynka_core::{UserId, UserRole};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid role: {0}. Valid roles: admin, employee")]
    InvalidRole(String),

    #[error("Name must not be blank")]
    BlankName,
}

/// Create a staff account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserError` for an unknown role, a blank name, or a database
/// failure.
pub async fn create(name: &str, role: &str) -> Result<UserId, UserError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(UserError::BlankName);
    }

    let store = PgStore::new(connect().await?);

    tracing::info!("Creating user: {} ({})", name, role);
    let mut tx = store.begin().await?;
    let user = tx
        .insert_user(&NewUser {
            name: name.to_owned(),
            role,
        })
        .await?;
    tx.commit().await?;

    tracing::info!(
        "User created successfully! ID: {}, Name: {}, Role: {}",
        user.id,
        user.name,
        user.role
    );

    Ok(user.id)
}

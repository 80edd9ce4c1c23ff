//! Audit log writes.
//!
//! Entries are written through the caller's transaction so they commit or
//! roll back together with the business change. A failed write is logged
//! and swallowed: the audit trail is never a reason to fail an operation.

use tracing::{debug, warn};

use madziarynka_core::{AuditAction, UserId};

use crate::db::StoreTransaction;
use crate::models::NewLogEntry;

/// Append an audit entry for `action`.
///
/// Without an acting user no row is written and a warning is emitted.
pub async fn record<T: StoreTransaction>(
    tx: &mut T,
    acting_user: Option<UserId>,
    action: AuditAction,
    details: String,
) {
    let Some(user_id) = acting_user else {
        warn!(action = %action, "No acting user, audit entry skipped");
        return;
    };

    let entry = NewLogEntry {
        user_id,
        action,
        details,
    };

    match tx.append_log(&entry).await {
        Ok(row) => debug!(log_id = %row.id, action = %action, "Audit entry recorded"),
        Err(e) => warn!(error = %e, action = %action, user_id = %user_id, "Failed to write audit entry"),
    }
}

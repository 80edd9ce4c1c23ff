//! Audit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use madziarynka_core::{AuditAction, LogEntryId, UserId};

/// A stored audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub module: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// An entry to append. The module is derived from the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub user_id: UserId,
    pub action: AuditAction,
    pub details: String,
}

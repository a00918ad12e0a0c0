//! Row types for the `users` table.

use sqlx::FromRow;
use vidova_core::types::{Id, Timestamp};

/// A row from the `users` table.
///
/// Authentication lives with the external session provider; this table
/// only carries what the orchestration core owns: the credit balance.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Id,
    pub email: String,
    pub credits: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

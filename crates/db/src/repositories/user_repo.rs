//! Repository for the `users` table.
//!
//! Credit mutations are single atomic UPDATEs; the balance is never read,
//! modified in Rust, and written back.

use sqlx::PgPool;
use vidova_core::types::Id;

use crate::models::user::UserRow;

/// Column list for `users` queries.
const COLUMNS: &str = "id, email, credits, created_at, updated_at";

/// Provides account lookup and atomic credit accounting.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user with a starting balance.
    pub async fn create(
        pool: &PgPool,
        id: Id,
        email: &str,
        credits: i64,
    ) -> Result<UserRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, email, credits) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(email)
            .bind(credits)
            .fetch_one(pool)
            .await
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: Id) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically decrement the balance by one; returns the new balance,
    /// or `None` when the user does not exist.
    pub async fn debit_credit(pool: &PgPool, id: Id) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE users SET credits = credits - 1, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING credits",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(credits,)| credits))
    }

    /// Atomically add purchased credits; returns the new balance, or
    /// `None` when the user does not exist.
    pub async fn add_credits(
        pool: &PgPool,
        id: Id,
        amount: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE users SET credits = credits + $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING credits",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(credits,)| credits))
    }
}

use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::info;

use crate::auth::{password::hash_password, role::Role};
use crate::config::AdminConfig;

/// Startup migration run before the server accepts traffic: leaves exactly
/// one supreme admin, the configured canonical identity. Idempotent; runs
/// inside a single transaction.
pub async fn ensure_canonical_admin(db: &SqlitePool, admin: &AdminConfig) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;

    let demoted = sqlx::query("UPDATE users SET role = ? WHERE role = ? AND email != ?")
        .bind(Role::Member)
        .bind(Role::SupremeAdmin)
        .bind(&admin.email)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&admin.email)
        .fetch_optional(&mut *tx)
        .await?;

    match existing {
        Some(id) => {
            sqlx::query("UPDATE users SET role = ? WHERE id = ?")
                .bind(Role::SupremeAdmin)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        None => {
            let hash = hash_password(&admin.password)?;
            sqlx::query(
                "INSERT INTO users (name, email, password_hash, role, created_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&admin.name)
            .bind(&admin.email)
            .bind(&hash)
            .bind(Role::SupremeAdmin)
            .bind(OffsetDateTime::now_utc())
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    info!(email = %admin.email, demoted, "canonical admin ensured");
    Ok(())
}

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use time::OffsetDateTime;

use crate::auth::role::Role;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub avatar: Option<String>,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Profile fields a user may change on their own account. Password arrives
/// already hashed.
#[derive(Debug, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar.is_none() && self.password_hash.is_none()
    }
}

impl User {
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, role, avatar, created_at
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, role, avatar, created_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn role_by_id(db: &SqlitePool, id: i64) -> Result<Option<Role>, ApiError> {
        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(role)
    }

    pub async fn create(
        db: &SqlitePool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash, role, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, name, email, password_hash, role, avatar, created_at",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// All users ordered by display name, for the admin listing. The
    /// credential column never leaves serialization.
    pub async fn list_all(db: &SqlitePool) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, role, avatar, created_at
             FROM users ORDER BY name ASC",
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn update_profile(
        db: &SqlitePool,
        id: i64,
        patch: &ProfilePatch,
    ) -> Result<User, ApiError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut sets = qb.separated(", ");
            if let Some(name) = &patch.name {
                sets.push("name = ").push_bind_unseparated(name);
            }
            if let Some(avatar) = &patch.avatar {
                sets.push("avatar = ").push_bind_unseparated(avatar);
            }
            if let Some(hash) = &patch.password_hash {
                sets.push("password_hash = ").push_bind_unseparated(hash);
            }
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.build().execute(db).await?;

        User::find_by_id(db, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Usuário não encontrado".into()))
    }

    /// Assigns a role. Promotion to supreme admin runs the existence check
    /// and the write inside one transaction so two concurrent promotions
    /// cannot both land.
    pub async fn set_role(db: &SqlitePool, target_id: i64, role: Role) -> Result<User, ApiError> {
        let mut tx = db.begin().await?;

        if role == Role::SupremeAdmin {
            let holder: Option<i64> =
                sqlx::query_scalar("SELECT id FROM users WHERE role = ? AND id != ?")
                    .bind(Role::SupremeAdmin)
                    .bind(target_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if holder.is_some() {
                return Err(ApiError::SupremeAdminExists);
            }
        }

        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET role = ? WHERE id = ?
             RETURNING id, name, email, password_hash, role, avatar, created_at",
        )
        .bind(role)
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuário não encontrado".into()))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Removes a user and every demanda they own, atomically.
    pub async fn delete_cascade(db: &SqlitePool, target_id: i64) -> Result<(), ApiError> {
        let mut tx = db.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound("Usuário não encontrado".into()));
        }

        sqlx::query("DELETE FROM demandas WHERE user_id = ?")
            .bind(target_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(target_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

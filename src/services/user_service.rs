use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::user::{Role, User, UserSummary};
use crate::utils::crypto::hash_password;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, is_active, reset_token, reset_token_expiry, created_at";

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

/// Emails are compared and stored trimmed and lower-cased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 AND is_active = TRUE",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(normalize_email(email))
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Fails with [`Error::Conflict`] when the email is taken, including when a
    /// concurrent insert wins the unique constraint.
    pub async fn create(&self, new_user: NewUser) -> Result<UserSummary> {
        let email = normalize_email(&new_user.email);
        if self.email_exists(&email).await? {
            return Err(Error::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&new_user.password)?;
        let created = sqlx::query_as::<_, UserSummary>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, role, is_active, created_at
            "#,
        )
        .bind(new_user.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::from)
        .map_err(|err| {
            if err.is_unique_violation() {
                Error::Conflict("Email already registered".to_string())
            } else {
                err
            }
        })?;

        tracing::info!(user_id = created.id, role = %new_user.role, "User registered");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email, role, is_active, created_at FROM users ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Flips `is_active` and returns the new value.
    pub async fn toggle_active(&self, id: i64) -> Result<bool> {
        let active = sqlx::query_scalar::<_, bool>(
            "UPDATE users SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = id, is_active = active, "User status toggled");
        Ok(active)
    }

    /// Unassigns the user's leads, then removes the user, atomically.
    /// Returns how many leads were unassigned.
    pub async fn delete(&self, id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let unassigned = sqlx::query("UPDATE leads SET assigned_to = NULL WHERE assigned_to = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(Error::NotFound("User not found".to_string()));
        }

        tx.commit().await?;
        tracing::info!(user_id = id, unassigned_leads = unassigned, "User deleted");
        Ok(unassigned)
    }

    pub async fn count_admins(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn store_reset_token(
        &self,
        user_id: i64,
        token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET reset_token = $2, reset_token_expiry = $3 WHERE id = $1")
            .bind(user_id)
            .bind(token_digest)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The user holding an unexpired token with this digest, if any.
    pub async fn find_by_reset_token(&self, token_digest: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE reset_token = $1 AND reset_token_expiry > $2",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token_digest)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Sets the new password and clears the token in one statement, so a token
    /// is honoured at most once. Returns the user id when the token was valid.
    pub async fn consume_reset_token(
        &self,
        token_digest: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expiry = NULL
            WHERE reset_token = $1 AND reset_token_expiry > $3
            RETURNING id
            "#,
        )
        .bind(token_digest)
        .bind(new_password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }
}

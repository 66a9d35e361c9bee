use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::middleware::auth::SessionUser;
use crate::services::user_service::UserService;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::{digest_token, digests_match, generate_reset_token, looks_like_reset_token};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
}

/// A freshly issued reset token. The raw value only ever leaves through the link.
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub user_id: i64,
    pub raw: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Changed,
    InvalidOrExpired,
}

pub fn reset_expiry(issued_at: DateTime<Utc>) -> DateTime<Utc> {
    issued_at + Duration::minutes(RESET_TOKEN_TTL_MINUTES)
}

impl AuthService {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }

    /// `None` for unknown, inactive, or wrong-password logins alike.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<SessionUser>> {
        let Some(user) = self.users.find_active_by_email(email).await? else {
            tracing::info!("Login rejected: no active account");
            return Ok(None);
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = user.id, "Login rejected: bad password");
            return Ok(None);
        }

        tracing::info!(user_id = user.id, "Login succeeded");
        Ok(Some(SessionUser::from(&user)))
    }

    /// Issues a token when an active account owns `email`. Callers must respond
    /// identically whether or not a token was issued.
    pub async fn request_password_reset(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<IssuedResetToken>> {
        let Some(user) = self.users.find_active_by_email(email).await? else {
            return Ok(None);
        };

        let raw = generate_reset_token();
        let expires_at = reset_expiry(now);
        self.users
            .store_reset_token(user.id, &digest_token(&raw), expires_at)
            .await?;

        tracing::info!(user_id = user.id, %expires_at, "Password reset token issued");
        Ok(Some(IssuedResetToken {
            user_id: user.id,
            raw,
            expires_at,
        }))
    }

    pub async fn reset_token_is_valid(&self, raw: &str, now: DateTime<Utc>) -> Result<bool> {
        if !looks_like_reset_token(raw) {
            return Ok(false);
        }
        let digest = digest_token(raw);
        let user = self.users.find_by_reset_token(&digest, now).await?;
        Ok(user
            .and_then(|u| u.reset_token)
            .is_some_and(|stored| digests_match(&stored, &digest)))
    }

    pub async fn reset_password(
        &self,
        raw: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome> {
        if !looks_like_reset_token(raw) {
            return Ok(ResetOutcome::InvalidOrExpired);
        }

        let password_hash = hash_password(new_password)?;
        match self
            .users
            .consume_reset_token(&digest_token(raw), &password_hash, now)
            .await?
        {
            Some(user_id) => {
                tracing::info!(user_id, "Password reset completed");
                Ok(ResetOutcome::Changed)
            }
            None => {
                tracing::info!("Password reset rejected: token invalid or expired");
                Ok(ResetOutcome::InvalidOrExpired)
            }
        }
    }

    /// Creates the configured admin when the database has none yet.
    pub async fn ensure_bootstrap_admin(
        &self,
        admin: &crate::config::BootstrapAdmin,
    ) -> Result<bool> {
        if self.users.count_admins().await? > 0 {
            return Ok(false);
        }
        let created = self
            .users
            .create(crate::services::user_service::NewUser {
                name: admin.name.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
                role: crate::models::user::Role::Admin,
            })
            .await?;
        tracing::warn!(user_id = created.id, email = %created.email, "Bootstrap admin created");
        Ok(true)
    }
}

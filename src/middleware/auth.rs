use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::flash::Outcome;
use crate::models::user::{Role, User};
use crate::services::lead_query::Viewer;

pub const USER_KEY: &str = "user";
pub const LOGIN_PATH: &str = "/auth/login";
pub const HOME_PATH: &str = "/dashboard";

/// What the session remembers about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl SessionUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::new(self.id, self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role(),
        }
    }
}

pub async fn start_session(session: &Session, user: &SessionUser) -> Result<()> {
    session.cycle_id().await?;
    session.insert(USER_KEY, user).await?;
    Ok(())
}

pub async fn end_session(session: &Session) -> Result<()> {
    session.flush().await?;
    Ok(())
}

pub async fn session_user(session: &Session) -> Option<SessionUser> {
    match session.get::<SessionUser>(USER_KEY).await {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(error = %err, "Unreadable session user");
            None
        }
    }
}

fn login_required() -> Outcome {
    Outcome::to(LOGIN_PATH).error("Please log in to access this page")
}

fn admin_required() -> Outcome {
    Outcome::to(HOME_PATH).error("Access denied: Admin only")
}

/// Any signed-in user. Anonymous requests are sent to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Outcome;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| login_required())?;
        let user = session_user(&session).await.ok_or_else(login_required)?;
        tracing::Span::current().record("user_id", user.id);
        Ok(CurrentUser(user))
    }
}

/// A signed-in admin. BDE users are bounced to the dashboard with a message.
#[derive(Debug, Clone)]
pub struct AdminUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = Outcome;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::info!(user_id = user.id, "Admin-only route refused");
            return Err(admin_required());
        }
        Ok(AdminUser(user))
    }
}

/// Keeps signed-in users away from the login and password-reset pages.
pub async fn guest_only(session: Session, req: Request, next: Next) -> Response {
    if session_user(&session).await.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }
    next.run(req).await
}

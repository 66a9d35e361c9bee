use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Form,
};
use tower_sessions::Session;

use crate::{
    dto::{
        auth_dto::{ForgotPasswordForm, LoginForm, RegisterForm, RegisterPageView, ResetPageView, ResetPasswordForm},
        view::{NoData, PageView},
    },
    middleware::{
        auth::{end_session, start_session, AdminUser, HOME_PATH, LOGIN_PATH},
        flash::{Flashes, FormResult, OrRedirect, Outcome},
    },
    models::user::Role,
    services::auth_service::ResetOutcome,
    utils::{time::now, token::looks_like_reset_token},
    AppState,
};

const REGISTER_PATH: &str = "/auth/register";
const FORGOT_PATH: &str = "/auth/forgot";
const RESET_REQUESTED: &str =
    "If an account exists for that email, a password reset link has been sent.";
const RESET_LINK_INVALID: &str = "Password reset link is invalid or has expired";

#[axum::debug_handler]
pub async fn login_page(flashes: Flashes) -> impl IntoResponse {
    Json(PageView::new("Login", None, flashes, NoData::default()))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> FormResult {
    if !form.is_complete() {
        return Err(Outcome::to(LOGIN_PATH).error("Email and password are required"));
    }

    let user = state
        .auth_service
        .authenticate(&form.email, &form.password)
        .await
        .or_redirect(LOGIN_PATH, "Server error. Please try again.")?
        .ok_or_else(|| Outcome::to(LOGIN_PATH).error("Invalid email or password"))?;

    start_session(&session, &user)
        .await
        .or_redirect(LOGIN_PATH, "Server error. Please try again.")?;

    Ok(Outcome::to(HOME_PATH).success(format!("Welcome back, {}!", user.name)))
}

#[axum::debug_handler]
pub async fn logout(session: Session) -> Outcome {
    if let Err(err) = end_session(&session).await {
        tracing::error!(error = %err, "Logout failed");
    }
    Outcome::to(LOGIN_PATH)
}

#[axum::debug_handler]
pub async fn register_page(AdminUser(user): AdminUser, flashes: Flashes) -> impl IntoResponse {
    Json(PageView::new(
        "Add User",
        Some(user),
        flashes,
        RegisterPageView {
            roles: vec![Role::Admin, Role::Bde],
        },
    ))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<RegisterForm>,
) -> FormResult {
    let new_user = form
        .into_new_user()
        .map_err(|msg| Outcome::to(REGISTER_PATH).error(msg))?;
    let name = new_user.name.clone();

    match state.user_service.create(new_user).await {
        Ok(created) => {
            tracing::info!(admin_id = admin.id, user_id = created.id, "Account created by admin");
            Ok(Outcome::to("/admin/users").success(format!("Account created for {}", name)))
        }
        Err(err) if err.is_unique_violation() => {
            Err(Outcome::to(REGISTER_PATH).error("Email already registered"))
        }
        Err(err) => {
            tracing::error!(error = %err, "Account creation failed");
            Err(Outcome::to(REGISTER_PATH).error("Failed to create account. Try again."))
        }
    }
}

#[axum::debug_handler]
pub async fn forgot_page(flashes: Flashes) -> impl IntoResponse {
    Json(PageView::new("Forgot Password", None, flashes, NoData::default()))
}

#[axum::debug_handler]
pub async fn forgot(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> FormResult {
    if form.email.trim().is_empty() {
        return Err(Outcome::to(FORGOT_PATH).error("Email is required"));
    }

    let issued = state
        .auth_service
        .request_password_reset(&form.email, now())
        .await
        .or_redirect(FORGOT_PATH, "Server error. Please try again.")?;

    if let Some(token) = issued {
        // Delivery is out of band; the link is only logged.
        tracing::info!(
            user_id = token.user_id,
            expires_at = %token.expires_at,
            reset_link = %state.config.reset_link(&token.raw),
            "Password reset link generated"
        );
    }

    Ok(Outcome::to(LOGIN_PATH).success(RESET_REQUESTED))
}

#[axum::debug_handler]
pub async fn reset_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
    flashes: Flashes,
) -> Result<impl IntoResponse, Outcome> {
    let valid = state
        .auth_service
        .reset_token_is_valid(&token, now())
        .await
        .or_redirect(FORGOT_PATH, "Server error. Please try again.")
        .map_err(|o| flashes.requeue_into(o))?;
    if !valid {
        return Err(flashes.requeue_into(Outcome::to(FORGOT_PATH).error(RESET_LINK_INVALID)));
    }

    Ok(Json(PageView::new(
        "Reset Password",
        None,
        flashes,
        ResetPageView { token },
    )))
}

#[axum::debug_handler]
pub async fn reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> FormResult {
    if !looks_like_reset_token(&token) {
        return Err(Outcome::to(FORGOT_PATH).error(RESET_LINK_INVALID));
    }
    let back = format!("/auth/reset/{}", token);
    form.check()
        .map_err(|msg| Outcome::to(back.as_str()).error(msg))?;

    match state
        .auth_service
        .reset_password(&token, &form.password, now())
        .await
        .or_redirect(&back, "Server error. Please try again.")?
    {
        ResetOutcome::Changed => {
            Ok(Outcome::to(LOGIN_PATH).success("Password updated. Please log in with your new password."))
        }
        ResetOutcome::InvalidOrExpired => Err(Outcome::to(FORGOT_PATH).error(RESET_LINK_INVALID)),
    }
}

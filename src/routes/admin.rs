use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::{admin_dto::UserListView, view::PageView},
    error::Error,
    middleware::{
        auth::{AdminUser, HOME_PATH},
        flash::{Flashes, FormResult, OrRedirect, Outcome},
    },
    AppState,
};

const USERS_PATH: &str = "/admin/users";

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    flashes: Flashes,
) -> Result<impl IntoResponse, Outcome> {
    let users = state
        .user_service
        .list()
        .await
        .or_redirect(HOME_PATH, "Failed to load users")
        .map_err(|o| flashes.requeue_into(o))?;
    Ok(Json(PageView::new(
        "Manage Users",
        Some(admin),
        flashes,
        UserListView { users },
    )))
}

#[axum::debug_handler]
pub async fn toggle_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> FormResult {
    if id == admin.id {
        return Err(Outcome::to(USERS_PATH).error("You cannot disable your own account"));
    }

    match state.user_service.toggle_active(id).await {
        Ok(_) => Ok(Outcome::to(USERS_PATH).success("User status updated")),
        Err(Error::NotFound(_)) => Err(Outcome::to(USERS_PATH).error("User not found")),
        Err(err) => {
            tracing::error!(error = %err, user_id = id, "Toggling user failed");
            Err(Outcome::to(USERS_PATH).error("Failed to update user"))
        }
    }
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> FormResult {
    if id == admin.id {
        return Err(Outcome::to(USERS_PATH).error("You cannot delete your own account"));
    }

    match state.user_service.delete(id).await {
        Ok(_) => Ok(Outcome::to(USERS_PATH).success("User deleted successfully")),
        Err(Error::NotFound(_)) => Err(Outcome::to(USERS_PATH).error("User not found")),
        Err(err) => {
            tracing::error!(error = %err, user_id = id, "Deleting user failed");
            Err(Outcome::to(USERS_PATH).error("Failed to delete user"))
        }
    }
}

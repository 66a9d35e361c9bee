use axum::{
    extract::State,
    response::{IntoResponse, Json, Redirect},
};
use chrono::NaiveDate;
use tower_sessions::Session;

use crate::{
    dto::{
        dashboard_dto::{DashboardView, ProfileView},
        view::PageView,
    },
    error::Result,
    middleware::{
        auth::{session_user, CurrentUser, HOME_PATH, LOGIN_PATH},
        flash::{Flashes, OrRedirect, Outcome},
    },
    services::lead_query::Viewer,
    utils::time::today,
    AppState,
};

const FOLLOW_UP_LIMIT: i64 = 10;
const RECENT_LIMIT: i64 = 5;
const PROFILE_RECENT_LIMIT: i64 = 8;

pub async fn root(session: Session) -> Redirect {
    if session_user(&session).await.is_some() {
        Redirect::to(HOME_PATH)
    } else {
        Redirect::to(LOGIN_PATH)
    }
}

async fn load_dashboard(state: &AppState, viewer: Viewer, day: NaiveDate) -> Result<DashboardView> {
    let stats = state.lead_service.stats(viewer).await?;
    let follow_ups = state
        .lead_service
        .follow_ups_on(viewer, day, FOLLOW_UP_LIMIT)
        .await?;
    let recent_leads = state.lead_service.recent(viewer, RECENT_LIMIT).await?;
    Ok(DashboardView {
        stats,
        follow_ups,
        recent_leads,
        today: day,
    })
}

#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: Flashes,
) -> impl IntoResponse {
    let day = today();
    match load_dashboard(&state, user.viewer(), day).await {
        Ok(view) => Json(PageView::new("Dashboard", Some(user), flashes, view)),
        Err(err) => {
            tracing::error!(error = %err, user_id = user.id, "Dashboard failed to load");
            Json(
                PageView::new("Dashboard", Some(user), flashes, DashboardView::empty(day))
                    .with_error("Failed to load dashboard data"),
            )
        }
    }
}

async fn load_profile(state: &AppState, viewer: Viewer) -> Result<Option<ProfileView>> {
    let Some(record) = state.user_service.find_by_id(viewer.id).await? else {
        return Ok(None);
    };
    let profile_stats = state.lead_service.stats(viewer).await?;
    let recent_leads = state
        .lead_service
        .recent(viewer, PROFILE_RECENT_LIMIT)
        .await?;
    Ok(Some(ProfileView {
        member_since: record.created_at,
        profile_stats,
        recent_leads,
    }))
}

#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: Flashes,
) -> std::result::Result<impl IntoResponse, Outcome> {
    let view = load_profile(&state, user.viewer())
        .await
        .or_redirect(HOME_PATH, "Failed to load profile")
        .map_err(|o| flashes.requeue_into(o))?
        .ok_or_else(|| flashes.requeue_into(Outcome::to(HOME_PATH).error("User not found")))?;
    Ok(Json(PageView::new("Profile", Some(user), flashes, view)))
}

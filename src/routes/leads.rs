use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Form,
};

use crate::{
    dto::{
        lead_dto::{LeadFilters, LeadForm, LeadFormView, LeadListParams, LeadListView},
        view::PageView,
    },
    error::Result,
    middleware::{
        auth::{AdminUser, CurrentUser, SessionUser, HOME_PATH},
        flash::{Flashes, FormResult, OrRedirect, Outcome},
    },
    models::{lead::LeadStatus, user::UserOption},
    services::lead_service::LeadAccess,
    utils::time::today,
    AppState,
};

const LEADS_PATH: &str = "/leads";
const NEW_LEAD_PATH: &str = "/leads/new";

fn edit_path(id: i64) -> String {
    format!("/leads/{}/edit", id)
}

/// The assignee picker is only offered to admins.
async fn assignable_for(state: &AppState, user: &SessionUser) -> Result<Vec<UserOption>> {
    if user.is_admin() {
        state.lead_service.assignable_users().await
    } else {
        Ok(Vec::new())
    }
}

async fn load_list(
    state: &AppState,
    user: &SessionUser,
    params: &LeadListParams,
) -> Result<LeadListView> {
    let viewer = user.viewer();
    let query = params.to_query(viewer);
    let day = today();

    let page = state.lead_service.list(&query).await?;
    let follow_ups_today = state.lead_service.count_follow_ups_on(viewer, day).await?;
    let bde_users = assignable_for(state, user).await?;

    Ok(LeadListView {
        total_leads: page.pagination.total,
        leads: page.items,
        pagination: page.pagination,
        filters: LeadFilters {
            status: query.status_filter().map(str::to_string),
            bde: query.assignee_filter(),
            search: query.search_filter().map(str::to_string),
        },
        bde_users,
        follow_ups_today,
        today: day,
        statuses: LeadStatus::ALL.to_vec(),
    })
}

#[axum::debug_handler]
pub async fn list_leads(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: Flashes,
    Query(params): Query<LeadListParams>,
) -> std::result::Result<impl IntoResponse, Outcome> {
    let view = load_list(&state, &user, &params)
        .await
        .or_redirect(HOME_PATH, "Failed to load leads")
        .map_err(|o| flashes.requeue_into(o))?;
    Ok(Json(PageView::new("Leads", Some(user), flashes, view)))
}

#[axum::debug_handler]
pub async fn new_lead_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: Flashes,
) -> std::result::Result<impl IntoResponse, Outcome> {
    let bde_users = assignable_for(&state, &user)
        .await
        .or_redirect(LEADS_PATH, "Failed to load the lead form")
        .map_err(|o| flashes.requeue_into(o))?;
    Ok(Json(PageView::new(
        "Add Lead",
        Some(user),
        flashes,
        LeadFormView {
            lead: None,
            bde_users,
            statuses: LeadStatus::ALL.to_vec(),
        },
    )))
}

#[axum::debug_handler]
pub async fn create_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<LeadForm>,
) -> FormResult {
    let fields = form
        .to_fields()
        .map_err(|msg| Outcome::to(NEW_LEAD_PATH).error(msg))?;

    // A BDE always owns what they create.
    let assignee = if user.is_admin() {
        form.requested_assignee().unwrap_or(user.id)
    } else {
        user.id
    };

    state
        .lead_service
        .create(&fields, Some(assignee))
        .await
        .or_redirect(NEW_LEAD_PATH, "Failed to add lead. Try again.")?;

    Ok(Outcome::to(LEADS_PATH).success("Lead added successfully!"))
}

#[axum::debug_handler]
pub async fn edit_lead_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flashes: Flashes,
    Path(id): Path<i64>,
) -> std::result::Result<impl IntoResponse, Outcome> {
    let lead = match state
        .lead_service
        .find_for(user.viewer(), id)
        .await
        .or_redirect(LEADS_PATH, "Failed to load lead")
        .map_err(|o| flashes.requeue_into(o))?
    {
        LeadAccess::Granted(lead) => lead,
        LeadAccess::Missing => {
            return Err(flashes.requeue_into(Outcome::to(LEADS_PATH).error("Lead not found")))
        }
        LeadAccess::Forbidden => {
            return Err(flashes
                .requeue_into(Outcome::to(LEADS_PATH).error("Access denied: Not your lead")))
        }
    };

    let bde_users = assignable_for(&state, &user)
        .await
        .or_redirect(LEADS_PATH, "Failed to load lead")
        .map_err(|o| flashes.requeue_into(o))?;

    Ok(Json(PageView::new(
        "Edit Lead",
        Some(user),
        flashes,
        LeadFormView {
            lead: Some(lead),
            bde_users,
            statuses: LeadStatus::ALL.to_vec(),
        },
    )))
}

#[axum::debug_handler]
pub async fn update_lead(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<LeadForm>,
) -> FormResult {
    let back = edit_path(id);

    let existing = match state
        .lead_service
        .find_for(user.viewer(), id)
        .await
        .or_redirect(&back, "Failed to update lead")?
    {
        LeadAccess::Granted(lead) => lead,
        LeadAccess::Missing => return Err(Outcome::to(LEADS_PATH).error("Lead not found")),
        LeadAccess::Forbidden => return Err(Outcome::to(LEADS_PATH).error("Access denied")),
    };

    let fields = form
        .to_fields()
        .map_err(|msg| Outcome::to(back.as_str()).error(msg))?;

    // Only admins may reassign.
    let assignee = if user.is_admin() {
        form.requested_assignee().or(existing.assigned_to)
    } else {
        existing.assigned_to
    };

    let updated = state
        .lead_service
        .update(user.viewer(), id, &fields, assignee)
        .await
        .or_redirect(&back, "Failed to update lead")?;
    if updated.is_none() {
        return Err(Outcome::to(LEADS_PATH).error("Access denied"));
    }

    Ok(Outcome::to(LEADS_PATH).success("Lead updated successfully!"))
}

#[axum::debug_handler]
pub async fn delete_lead(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> FormResult {
    let deleted = state
        .lead_service
        .delete(id)
        .await
        .or_redirect(LEADS_PATH, "Failed to delete lead")?;

    if !deleted {
        return Err(Outcome::to(LEADS_PATH).error("Lead not found"));
    }
    tracing::info!(admin_id = admin.id, lead_id = id, "Lead removed by admin");
    Ok(Outcome::to(LEADS_PATH).success("Lead deleted"))
}

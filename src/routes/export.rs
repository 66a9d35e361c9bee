use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::{
    middleware::{
        auth::AdminUser,
        flash::{OrRedirect, Outcome},
    },
    services::export_service::{ExportService, XLSX_CONTENT_TYPE},
    utils::time::today,
    AppState,
};

/// Export every lead as XLSX
#[axum::debug_handler]
pub async fn export_leads(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<impl IntoResponse, Outcome> {
    let leads = state
        .lead_service
        .all_for_export()
        .await
        .or_redirect("/leads", "Export failed")?;

    let buffer =
        ExportService::generate_leads_xlsx(&leads).or_redirect("/leads", "Export failed")?;

    tracing::info!(admin_id = admin.id, rows = leads.len(), "Leads exported");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        ExportService::file_name(today())
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}

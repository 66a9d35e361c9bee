pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod export;
pub mod health;
pub mod leads;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use crate::middleware::{auth::guest_only, flash::persist_flashes};
use crate::AppState;

/// The whole application: pages, forms, session and flash plumbing.
pub fn router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.session_secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            state.config.session_ttl_hours,
        )));

    let guest_routes = Router::new()
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/forgot", get(auth::forgot_page).post(auth::forgot))
        .route("/auth/reset/:token", get(auth::reset_page).post(auth::reset))
        .route_layer(from_fn(guest_only));

    let app_routes = Router::new()
        .route("/", get(dashboard::root))
        .route("/health", get(health::health))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/register", get(auth::register_page).post(auth::register))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/profile", get(dashboard::profile))
        .route("/leads", get(leads::list_leads).post(leads::create_lead))
        .route("/leads/new", get(leads::new_lead_form))
        .route("/leads/export/excel", get(export::export_leads))
        .route("/leads/:id", post(leads::update_lead))
        .route("/leads/:id/edit", get(leads::edit_lead_form))
        .route("/leads/:id/delete", post(leads::delete_lead))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id/toggle", post(admin::toggle_user))
        .route("/admin/users/:id/delete", post(admin::delete_user));

    Router::new()
        .merge(guest_routes)
        .merge(app_routes)
        .fallback(health::not_found)
        .layer(from_fn(persist_flashes))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state)
}

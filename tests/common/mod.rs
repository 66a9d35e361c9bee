#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use crm_backend::{config::Config, routes, utils::crypto::hash_password, AppState};
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;

pub const PASSWORD: &str = "Secret@123";

/// `None` when no database is configured; callers skip.
pub async fn setup() -> Option<(Router, AppState)> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to create test pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let config = Config {
        server_address: "127.0.0.1:0".into(),
        database_url,
        database_max_connections: 5,
        app_base_url: url::Url::parse("http://localhost:3000/").unwrap(),
        session_secure: false,
        session_ttl_hours: 8,
        bootstrap_admin: None,
    };
    let state = AppState::new(pool, config);
    Some((routes::router(state.clone()), state))
}

pub fn unique(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}_{}_{}@example.com", prefix, nanos, n)
}

pub async fn seed_user(pool: &PgPool, role: &str) -> (i64, String) {
    let email = unique(role);
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(format!("Test {}", role))
    .bind(&email)
    .bind(hash_password(PASSWORD).unwrap())
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("seed user");
    (id, email)
}

/// Inserts a lead; `age_minutes` pushes `created_at` into the past.
pub async fn seed_lead(pool: &PgPool, name: &str, assigned_to: Option<i64>, age_minutes: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO leads (name, email, phone, source, status, assigned_to, created_at)
           VALUES ($1, $2, '555-0100', 'Website', 'New', $3, NOW() - make_interval(mins => $4::int))
           RETURNING id"#,
    )
    .bind(name)
    .bind(format!("{}@lead.example.com", name.to_lowercase().replace(' ', ".")))
    .bind(assigned_to)
    .bind(age_minutes as i32)
    .fetch_one(pool)
    .await
    .expect("seed lead")
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Logs in and returns the session cookie to send on later requests.
pub async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, String, Option<String>) {
    let body = format!(
        "email={}&password={}",
        email.replace('@', "%40"),
        password.replace('@', "%40")
    );
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    (resp.status(), location(&resp), session_cookie(&resp))
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: &Router, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn json(resp: Response<Body>) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 4 * 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn set_lead_status(pool: &PgPool, id: i64, status: &str) {
    sqlx::query("UPDATE leads SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await
        .expect("set lead status");
}

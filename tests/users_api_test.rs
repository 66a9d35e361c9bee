mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::*;
use crm_backend::services::auth_service::ResetOutcome;

#[tokio::test]
async fn deleting_a_user_unassigns_their_leads() {
    let Some((app, state)) = setup().await else { return };
    let (_, admin_email) = seed_user(&state.pool, "admin").await;
    let (bde_id, _) = seed_user(&state.pool, "bde").await;
    let lead = seed_lead(&state.pool, "Orphaned Lead", Some(bde_id), 0).await;

    let (_, _, cookie) = login(&app, &admin_email, PASSWORD).await;
    let resp = post_form(
        &app,
        &format!("/admin/users/{}/delete", bde_id),
        cookie.as_deref(),
        "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin/users");

    let assigned: Option<i64> = sqlx::query_scalar("SELECT assigned_to FROM leads WHERE id = $1")
        .bind(lead)
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(assigned, None);

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(bde_id)
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[tokio::test]
async fn admin_cannot_delete_self() {
    let Some((app, state)) = setup().await else { return };
    let (admin_id, admin_email) = seed_user(&state.pool, "admin").await;

    let (_, _, cookie) = login(&app, &admin_email, PASSWORD).await;
    post_form(
        &app,
        &format!("/admin/users/{}/delete", admin_id),
        cookie.as_deref(),
        "",
    )
    .await;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(admin_id)
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
}

#[tokio::test]
async fn deactivated_account_cannot_log_in() {
    let Some((app, state)) = setup().await else { return };
    let (_, admin_email) = seed_user(&state.pool, "admin").await;
    let (bde_id, bde_email) = seed_user(&state.pool, "bde").await;

    let (_, _, cookie) = login(&app, &admin_email, PASSWORD).await;
    post_form(
        &app,
        &format!("/admin/users/{}/toggle", bde_id),
        cookie.as_deref(),
        "",
    )
    .await;

    let (status, to, _) = login(&app, &bde_email, PASSWORD).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(to, "/auth/login");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let Some((app, state)) = setup().await else { return };
    let (_, email) = seed_user(&state.pool, "bde").await;

    let (_, to, _) = login(&app, &email, "not-the-password").await;
    assert_eq!(to, "/auth/login");
}

#[tokio::test]
async fn bde_is_kept_out_of_user_admin() {
    let Some((app, state)) = setup().await else { return };
    let (_, email) = seed_user(&state.pool, "bde").await;

    let (_, _, cookie) = login(&app, &email, PASSWORD).await;
    let resp = get(&app, "/admin/users", cookie.as_deref()).await;
    assert_eq!(location(&resp), "/dashboard");
}

#[tokio::test]
async fn reset_token_works_once() {
    let Some((_app, state)) = setup().await else { return };
    let (_, email) = seed_user(&state.pool, "bde").await;
    let now = chrono::Utc::now();

    let issued = state
        .auth_service
        .request_password_reset(&email, now)
        .await
        .unwrap()
        .expect("token issued for known email");

    let first = state
        .auth_service
        .reset_password(&issued.raw, "NewSecret1", now)
        .await
        .unwrap();
    assert_eq!(first, ResetOutcome::Changed);

    let second = state
        .auth_service
        .reset_password(&issued.raw, "Another22", now)
        .await
        .unwrap();
    assert_eq!(second, ResetOutcome::InvalidOrExpired);

    let user = state
        .auth_service
        .authenticate(&email, "NewSecret1")
        .await
        .unwrap();
    assert!(user.is_some());
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let Some((_app, state)) = setup().await else { return };
    let (_, email) = seed_user(&state.pool, "bde").await;
    let now = chrono::Utc::now();

    let issued = state
        .auth_service
        .request_password_reset(&email, now)
        .await
        .unwrap()
        .unwrap();

    let later = issued.expires_at + Duration::seconds(1);
    let outcome = state
        .auth_service
        .reset_password(&issued.raw, "NewSecret1", later)
        .await
        .unwrap();
    assert_eq!(outcome, ResetOutcome::InvalidOrExpired);
}

#[tokio::test]
async fn unknown_email_issues_no_token() {
    let Some((_app, state)) = setup().await else { return };
    let issued = state
        .auth_service
        .request_password_reset(&unique("ghost"), chrono::Utc::now())
        .await
        .unwrap();
    assert!(issued.is_none());
}

/// Status, redirect target and follow-up flash of one forgot-password submission.
async fn forgot_reply(app: &axum::Router, email: &str) -> (StatusCode, String, serde_json::Value) {
    let body = format!("email={}", email.replace('@', "%40"));
    let resp = post_form(app, "/auth/forgot", None, &body).await;
    let status = resp.status();
    let to = location(&resp);
    let cookie = session_cookie(&resp);

    let page = json(get(app, &to, cookie.as_deref()).await).await;
    (status, to, page["flash"].clone())
}

#[tokio::test]
async fn forgot_password_reply_is_identical_for_known_and_unknown_emails() {
    let Some((app, state)) = setup().await else { return };
    let (_, known) = seed_user(&state.pool, "bde").await;

    let (known_status, known_to, known_flash) = forgot_reply(&app, &known).await;
    let (unknown_status, unknown_to, unknown_flash) = forgot_reply(&app, &unique("ghost")).await;

    assert_eq!(known_status, StatusCode::SEE_OTHER);
    assert_eq!(known_status, unknown_status);
    assert_eq!(known_to, "/auth/login");
    assert_eq!(known_to, unknown_to);
    assert_eq!(known_flash.as_array().map(Vec::len), Some(1));
    assert_eq!(known_flash, unknown_flash);
}

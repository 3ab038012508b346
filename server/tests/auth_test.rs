//! Account and access-control tests: registration, login, sessions,
//! token expiry, the page gate and the dashboards behind it.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use common::{PASSWORD, TestApp, event_json};
use serde_json::json;
use tower::ServiceExt;

fn register_body(email: &str, password: &str) -> serde_json::Value {
    json!({"name": "Grace Hopper", "email": email, "password": password})
}

#[tokio::test]
async fn test_register_then_me() {
    let app = TestApp::new();

    let registered = app
        .post("/api/auth/register", None, register_body("Grace@Example.com", "cobol-rules"))
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert_eq!(registered.body["user"]["email"], "grace@example.com");
    assert_eq!(registered.body["user"]["role"], "user");
    assert!(registered.body["user"].get("password").is_none());

    let cookie = registered.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let token = registered.body["token"].as_str().unwrap();
    let me = app.get("/api/auth/me", Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["id"], registered.body["user"]["id"]);
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = TestApp::new();

    let short = app
        .post("/api/auth/register", None, register_body("a@example.com", "short"))
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.len("users").await, 0);

    let bad_email = app
        .post("/api/auth/register", None, register_body("not-an-email", "long enough"))
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    let first = app
        .post("/api/auth/register", None, register_body("dup@example.com", "long enough"))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    let second = app
        .post("/api/auth/register", None, register_body("DUP@example.com", "long enough"))
        .await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.error_message(), "Email is already registered");
    assert_eq!(app.store.len("users").await, 1);
}

#[tokio::test]
async fn test_registration_cannot_pick_a_role() {
    let app = TestApp::new();
    let response = app
        .post(
            "/api/auth/register",
            None,
            json!({"name": "Eve", "email": "eve@example.com", "password": "long enough", "role": "admin"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["user"]["role"], "user");
}

#[tokio::test]
async fn test_login_success_and_uniform_failures() {
    let app = TestApp::new();
    app.member("Mia", "mia@example.com").await;

    let ok = app
        .post("/api/auth/login", None, json!({"email": " MIA@example.com ", "password": PASSWORD}))
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["user"]["name"], "Mia");
    assert!(ok.body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let wrong_password = app
        .post("/api/auth/login", None, json!({"email": "mia@example.com", "password": "nope nope"}))
        .await;
    let unknown_email = app
        .post("/api/auth/login", None, json!({"email": "who@example.com", "password": PASSWORD}))
        .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let app = TestApp::new();
    let (user, token) = app.member("Mia", "mia@example.com").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("theme=dark; session_token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.body["id"], user.id.to_string());
}

#[tokio::test]
async fn test_missing_and_expired_tokens() {
    let app = TestApp::new();
    let (_, token) = app.member("Mia", "mia@example.com").await;

    let anonymous = app.get("/api/auth/me", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["code"], "UNAUTHORIZED");

    app.clock.advance(chrono::Duration::days(8));
    let expired = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_rejected() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    let (user, token) = app.member("Mia", "mia@example.com").await;

    app.delete(&format!("/api/users/{}", user.id), Some(&admin)).await;
    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();
    let response = app.send(Method::POST, "/api/auth/logout", None, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_admin_page_redirects_visitors_to_login() {
    let app = TestApp::new();
    let (_, member) = app.member("Mia", "mia@example.com").await;

    let anonymous = app.get("/admin", None).await;
    assert_eq!(anonymous.status, StatusCode::SEE_OTHER);
    assert_eq!(anonymous.headers[header::LOCATION], "/login?callbackUrl=%2Fadmin");

    let wrong_role = app.get("/admin?tab=users", Some(&member)).await;
    assert_eq!(wrong_role.status, StatusCode::SEE_OTHER);
    assert_eq!(
        wrong_role.headers[header::LOCATION],
        "/login?callbackUrl=%2Fadmin%3Ftab%3Dusers"
    );

    let manager_page = app.get("/manager", Some(&member)).await;
    assert_eq!(manager_page.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_admin_dashboard() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    app.member("Mia", "mia@example.com").await;

    let created = app.post("/api/events", Some(&admin), event_json("Launch")).await;
    let event_id = created.body["id"].as_str().unwrap().to_string();
    app.post(
        "/api/tickets",
        Some(&admin),
        json!({"event_id": event_id, "price_cents": 1500, "status": "sold"}),
    )
    .await;
    for (amount, currency, status) in [
        (1500, "EUR", "completed"),
        (500, "EUR", "completed"),
        (900, "USD", "completed"),
        (700, "EUR", "pending"),
    ] {
        app.post(
            "/api/payments",
            Some(&admin),
            json!({"amount_cents": amount, "currency": currency, "method": "card", "status": status}),
        )
        .await;
    }

    let page = app.get("/admin", Some(&admin)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["users"], 2);
    assert_eq!(page.body["events"], 1);
    assert_eq!(page.body["published_events"], 1);
    assert_eq!(page.body["tickets_sold"], 1);
    assert_eq!(page.body["revenue_cents"]["EUR"], 2000);
    assert_eq!(page.body["revenue_cents"]["USD"], 900);
    assert_eq!(page.body["page_views"]["placeholder"], true);
    assert_eq!(page.body["page_views"]["points"].as_array().unwrap().len(), 7);

    let api = app.get("/api/admin/overview", Some(&admin)).await;
    assert_eq!(api.status, StatusCode::OK);
    assert_eq!(api.body["users"], 2);
}

#[tokio::test]
async fn test_admin_overview_survives_huge_revenue() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    for _ in 0..2 {
        let created = app
            .post(
                "/api/payments",
                Some(&admin),
                json!({
                    "amount_cents": 10_000_000_000_000_000_000_u64,
                    "currency": "USD",
                    "method": "card",
                    "status": "completed",
                }),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
    }

    let overview = app.get("/api/admin/overview", Some(&admin)).await;
    assert_eq!(overview.status, StatusCode::OK);
    assert_eq!(overview.body["revenue_cents"]["USD"], u64::MAX);
}

#[tokio::test]
async fn test_overview_api_answers_with_status_codes() {
    let app = TestApp::new();
    let (_, member) = app.member("Mia", "mia@example.com").await;
    let (_, manager) = app.manager().await;

    assert_eq!(app.get("/api/admin/overview", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/admin/overview", Some(&member)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/admin/overview", Some(&manager)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/manager/overview", Some(&member)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/manager/overview", Some(&manager)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_manager_dashboard_counts_own_events() {
    let app = TestApp::new();
    let (manager_user, manager) = app.manager().await;
    let (_, mia) = app.member("Mia", "mia@example.com").await;
    let (_, leo) = app.member("Leo", "leo@example.com").await;

    let mut mine = event_json("My Gig");
    mine["organizer_id"] = json!(manager_user.id);
    let mine = app.post("/api/events", Some(&manager), mine).await;
    let mine_id = mine.body["id"].as_str().unwrap().to_string();
    app.post("/api/events", Some(&manager), event_json("Someone else's")).await;

    let rsvp = format!("/api/events/{mine_id}/responses");
    app.post(&rsvp, Some(&mia), json!({"status": "going"})).await;
    app.post(&rsvp, Some(&leo), json!({"status": "interested"})).await;

    app.post(
        "/api/analytics",
        Some(&manager),
        json!({"metric": "page_views", "value": 42.0, "recorded_at": "2024-12-31T12:00:00Z"}),
    )
    .await;

    let overview = app.get("/manager", Some(&manager)).await;
    assert_eq!(overview.status, StatusCode::OK);
    assert_eq!(overview.body["events"].as_array().unwrap().len(), 1);
    assert_eq!(overview.body["events"][0]["title"], "My Gig");
    assert_eq!(overview.body["events"][0]["going"], 1);
    assert_eq!(overview.body["events"][0]["interested"], 1);
    assert_eq!(overview.body["total_rsvps"], 2);

    let chart = &overview.body["page_views"];
    assert_eq!(chart["placeholder"], false);
    let points = chart["points"].as_array().unwrap();
    assert_eq!(points[5]["date"], "2024-12-31");
    assert_eq!(points[5]["value"], 42.0);
    assert_eq!(points[6]["value"], 0.0);
}

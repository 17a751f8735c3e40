//! End-to-end HTTP tests over the in-memory store.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{body_json, build_test_app, send};
use serde_json::json;
use tower::ServiceExt;

use aquiestoy::auth::jwt::TokenService;

#[tokio::test]
async fn root_reports_status() {
    let app = build_test_app();
    let response = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn register_login_profile_scenario() {
    let app = build_test_app();
    let creds = json!({ "email": "a@x.com", "password": "secret1", "name": "A" });

    let response = send(&app, Method::POST, "/auth/register", Some(creds.clone()), None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["message"].is_string());
    let user_id = json["user"]["id"].as_i64().expect("id");
    assert_eq!(json["user"]["email"], "a@x.com");
    assert_eq!(json["user"]["name"], "A");
    assert!(!json["user"]["token"].as_str().expect("token").is_empty());
    assert!(json["user"].get("password").is_none());
    assert!(json["user"].get("password_hash").is_none());

    let response = send(&app, Method::POST, "/auth/register", Some(creds), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Email already registered");

    let response = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "a@x.com", "password": "wrong" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid credentials");

    let response = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "a@x.com", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["id"].as_i64(), Some(user_id));
    let token = json["user"]["token"].as_str().expect("token").to_string();

    let claims = TokenService::new(common::SECRET)
        .validate(&token)
        .expect("login token validates");
    assert_eq!(claims.user_id, user_id);
    assert_eq!(claims.email, "a@x.com");

    let response = send(&app, Method::GET, "/api/profile", None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "user": { "id": user_id, "email": "a@x.com", "name": "A" } })
    );

    let response = send(&app, Method::GET, "/api/profile", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_the_same() {
    let app = build_test_app();
    send(
        &app,
        Method::POST,
        "/auth/register",
        Some(json!({ "email": "a@x.com", "password": "secret1", "name": "A" })),
        None,
    )
    .await;

    let wrong = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "a@x.com", "password": "nope-nope" })),
        None,
    )
    .await;
    let unknown = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "ghost@x.com", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong).await, body_json(unknown).await);
}

#[tokio::test]
async fn email_is_normalized_before_lookup() {
    let app = build_test_app();
    let response = send(
        &app,
        Method::POST,
        "/auth/register",
        Some(json!({ "email": " Mixed@X.com ", "password": "secret1", "name": "M" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["user"]["email"], "mixed@x.com");

    let response = send(
        &app,
        Method::POST,
        "/auth/register",
        Some(json!({ "email": "mixed@x.com", "password": "secret1", "name": "M" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_bodies_are_bad_requests() {
    let app = build_test_app();
    let cases = [
        json!({ "email": "a@x.com", "password": "12345", "name": "A" }),
        json!({ "email": "not-an-email", "password": "secret1", "name": "A" }),
        json!({ "email": "a@x.com", "password": "secret1", "name": "" }),
        json!({ "email": "a@x.com", "password": "secret1" }),
        json!({ "email": 5, "password": "secret1", "name": "A" }),
    ];
    for body in cases {
        let response = send(&app, Method::POST, "/auth/register", Some(body.clone()), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert!(body_json(response).await["error"].is_string());
    }

    let response = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "a@x.com" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_content_type_is_a_bad_request() {
    let app = build_test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .body(Body::from(r#"{"email":"a@x.com","password":"secret1"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["details"].is_string());
}

#[tokio::test]
async fn profile_rejects_bad_authorization() {
    let app = build_test_app();
    let foreign = TokenService::new(b"not-the-server-secret")
        .issue(1, "a@x.com")
        .unwrap();

    for value in [
        "Bearer".to_string(),
        format!("Basic {foreign}"),
        format!("Bearer {foreign}"),
        "Bearer abc.def.ghi".to_string(),
    ] {
        let request = Request::builder()
            .uri("/api/profile")
            .header(header::AUTHORIZATION, &value)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header: {value}");
    }
}

#[tokio::test]
async fn token_for_missing_user_is_not_found() {
    let app = build_test_app();
    let token = TokenService::new(common::SECRET)
        .issue(9_999, "ghost@x.com")
        .unwrap();
    let response = send(&app, Method::GET, "/api/profile", None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "User not found");
}

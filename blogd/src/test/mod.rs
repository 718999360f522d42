//! End-to-end tests over the full router and the in-memory store.

pub mod utils;

use axum::http::{StatusCode, header};
use serde_json::{Value, json};
use utils::{create_post, create_test_config, create_test_server, create_test_server_with_config, register_user, session_cookie};

use crate::config::{CorsOrigin, Environment};

#[test_log::test(tokio::test)]
async fn test_register_post_and_owner_only_delete() {
    let server = create_test_server();

    let alice = register_user(&server, "alice@x.com", "Alice").await;
    let post = create_post(
        &server,
        &alice,
        json!({ "title": "First", "content": "Hello", "category": "Education" }),
    )
    .await;
    let path = format!("/posts/{}", post["id"].as_str().unwrap());

    let bob = register_user(&server, "bob@x.com", "Bob").await;
    let response = server.delete(&path).add_header(header::COOKIE, session_cookie(&bob)).await;
    response.assert_status_forbidden();
    let body: Value = response.json();
    assert_eq!(body["statusCode"], 403);
    assert_eq!(body["error"], "Forbidden");
    assert!(body["message"].is_string());

    let response = server.delete(&path).add_header(header::COOKIE, session_cookie(&alice)).await;
    response.assert_status_ok();
    assert!(response.text().to_lowercase().contains("success"));

    let posts: Vec<Value> = server.get("/posts").await.json();
    assert!(posts.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_session_from_login_works_like_session_from_register() {
    let server = create_test_server();
    register_user(&server, "a@x.com", "A").await;

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": "a@x.com", "password": utils::TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let created: Value = server
        .post("/posts")
        .add_header(header::COOKIE, cookie.clone())
        .json(&json!({ "title": "T", "content": "C", "category": "Sport" }))
        .await
        .json();
    assert_eq!(created["user"]["email"], "a@x.com");

    let mine: Vec<Value> = server.get("/posts/me").add_header(header::COOKIE, cookie).await.json();
    assert_eq!(mine.len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_unauthenticated_body_shape_is_uniform() {
    let server = create_test_server();

    for request in [
        server.post("/auth/logout"),
        server.get("/posts/me"),
        server.post("/posts"),
        server.put("/posts/not-even-a-uuid"),
        server.delete("/posts/not-even-a-uuid"),
    ] {
        let response = request.await;
        response.assert_status_unauthorized();
        let body: Value = response.json();
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["error"], "Unauthorized");
        assert!(body["message"].is_string());
    }
}

#[test_log::test(tokio::test)]
async fn test_expired_session_is_rejected() {
    let mut config = create_test_config();
    config.auth.session.timeout = std::time::Duration::from_secs(1);
    let server = create_test_server_with_config(config);

    let user = register_user(&server, "a@x.com", "A").await;
    server
        .get("/posts/me")
        .add_header(header::COOKIE, session_cookie(&user))
        .await
        .assert_status_ok();

    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    server
        .get("/posts/me")
        .add_header(header::COOKIE, session_cookie(&user))
        .await
        .assert_status_unauthorized();
}

#[test_log::test(tokio::test)]
async fn test_production_cookie_is_secure() {
    let mut config = create_test_config();
    config.environment = Environment::Production;
    let server = create_test_server_with_config(config);

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "a@x.com",
            "password": "123456",
            "confirmPassword": "123456",
            "name": "A",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));
}

#[test_log::test(tokio::test)]
async fn test_cors_allows_configured_origin_with_credentials() {
    let mut config = create_test_config();
    config.auth.security.cors.allowed_origins = vec![CorsOrigin::Url("http://localhost:3000".parse().unwrap())];
    let server = create_test_server_with_config(config);

    let response = server.get("/posts").add_header(header::ORIGIN, "http://localhost:3000").await;
    response.assert_status_ok();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");

    let response = server.get("/posts").add_header(header::ORIGIN, "http://evil.example").await;
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[test_log::test(tokio::test)]
async fn test_healthz() {
    let server = create_test_server();
    let response = server.get("/healthz").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

#[test_log::test(tokio::test)]
async fn test_openapi_json_endpoint() {
    let server = create_test_server();

    let response = server.get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code().as_u16(), 200);
    let content = response.text();
    assert!(content.contains("\"openapi\""));
    assert!(content.contains("/auth/register"));
    assert!(content.contains("CookieAuth"));

    server.get("/docs").await.assert_status_ok();
}

#[test_log::test(tokio::test)]
async fn test_application_serves_from_config() {
    let app = crate::Application::new(create_test_config()).await.unwrap();
    let server = app.into_test_server();
    server.get("/healthz").await.assert_status_ok();
    server.get("/posts").await.assert_status_ok();
}

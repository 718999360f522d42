//! Test utilities for in-process integration testing
use crate::{
    AppState, build_router,
    config::{Config, PasswordConfig},
    db::MemoryStore,
};
use axum::http::{StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "123456";

/// A registered user and the session token the server issued for them
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub token: String,
}

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.secret_key = Some("test-secret-key-for-blogd".to_string());
    // Cheap hashing keeps the suite fast
    config.auth.password = PasswordConfig {
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    };
    config
}

pub fn create_test_server_with_config(config: Config) -> TestServer {
    let state = AppState::new(config, MemoryStore::new()).expect("Failed to create app state");
    let router = build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

pub fn create_test_server() -> TestServer {
    create_test_server_with_config(create_test_config())
}

/// Pull the token out of a `Set-Cookie: blogd_session=<token>; ...` value
pub fn token_from_set_cookie(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, token)| token.to_string())
        .expect("Set-Cookie without a name=value pair")
}

/// Register through the API and return the new user with their session
pub async fn register_user(server: &TestServer, email: &str, name: &str) -> TestUser {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
            "confirmPassword": TEST_PASSWORD,
            "name": name,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("register should set a cookie")
        .to_str()
        .unwrap()
        .to_string();
    let body: Value = response.json();

    TestUser {
        id: body["id"].as_str().unwrap().parse().unwrap(),
        email: body["email"].as_str().unwrap().to_string(),
        name: body["name"].as_str().unwrap().to_string(),
        token: token_from_set_cookie(&set_cookie),
    }
}

/// `Cookie` header value carrying `user`'s session
pub fn session_cookie(user: &TestUser) -> String {
    format!("blogd_session={}", user.token)
}

/// Create a post as `user` and return the response body
pub async fn create_post(server: &TestServer, user: &TestUser, body: Value) -> Value {
    let response = server
        .post("/posts")
        .add_header(header::COOKIE, session_cookie(user))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

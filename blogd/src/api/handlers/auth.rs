use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        models::{
            auth::{AuthResponse, LoginRequest, LogoutResponse, RegisterRequest},
            users::Identity,
        },
        validation::Validate,
    },
    db::store::Store,
    errors::{Error, ErrorBody},
};

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered, session cookie set", body = Identity,
            headers(("set-cookie" = String, description = "HttpOnly session cookie"))),
        (status = 400, description = "Field -> message map, e.g. {\"email\": \"Email already exists\"}"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<AuthResponse, Error> {
    let Json(request) = payload?;
    let registration = request.validate()?;

    let session = state.auth.register(registration).await?;

    Ok(AuthResponse {
        status: StatusCode::CREATED,
        identity: session.identity,
        cookie: session.cookie,
    })
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Logged in, session cookie set", body = Identity,
            headers(("set-cookie" = String, description = "HttpOnly session cookie"))),
        (status = 400, description = "Invalid input (field map) or invalid credentials", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<AuthResponse, Error> {
    let Json(request) = payload?;
    let credentials = request.validate()?;

    let session = state.auth.login(credentials).await?;

    Ok(AuthResponse {
        status: StatusCode::OK,
        identity: session.identity,
        cookie: session.cookie,
    })
}

/// Log out (clear the session cookie)
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logged out, session cookie cleared", body = String),
        (status = 401, description = "No valid session", body = ErrorBody),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn logout<S: Store>(State(state): State<AppState<S>>, identity: Identity) -> Result<LogoutResponse, Error> {
    Ok(LogoutResponse {
        message: "Logged out successfully",
        cookie: state.auth.logout(&identity),
    })
}

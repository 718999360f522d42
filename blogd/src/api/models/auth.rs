use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::api::models::users::Identity;

/// Login request body.
///
/// Fields are kept as raw JSON so that missing, `null` and mistyped values all reach validation
/// and are reported per field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    #[schema(value_type = String)]
    pub email: Option<Value>,
    #[schema(value_type = String)]
    pub password: Option<Value>,
}

/// Registration request body. Raw JSON fields, as for [`LoginRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(value_type = String)]
    pub email: Option<Value>,
    #[schema(value_type = String)]
    pub password: Option<Value>,
    #[schema(value_type = String)]
    pub confirm_password: Option<Value>,
    #[schema(value_type = String)]
    pub name: Option<Value>,
}

/// Validated login input
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Validated registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Identity body plus the `Set-Cookie` header carrying the session token
#[derive(Debug)]
pub struct AuthResponse {
    pub status: StatusCode,
    pub identity: Identity,
    pub cookie: String,
}

impl IntoResponse for AuthResponse {
    fn into_response(self) -> Response {
        (self.status, [(header::SET_COOKIE, self.cookie)], Json(self.identity)).into_response()
    }
}

/// Plain text confirmation plus the `Set-Cookie` header that clears the session
#[derive(Debug)]
pub struct LogoutResponse {
    pub message: &'static str,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::SET_COOKIE, self.cookie)], self.message).into_response()
    }
}

use crate::api::validation::FieldErrors;
use crate::db::errors::DbError;
use crate::types::Operation;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email already exists";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

#[derive(ThisError, Debug)]
pub enum Error {
    /// One or more input fields failed validation
    #[error("Validation failed for {} field(s)", errors.len())]
    Validation { errors: FieldErrors },

    /// Registration attempted with an email that already has an account
    #[error("Email already exists")]
    DuplicateEmail,

    /// Login failed. Deliberately does not say whether the email exists.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Authentication required but not provided, or the session is not valid
    #[error("Not authenticated")]
    Unauthenticated,

    /// Authenticated caller does not own the target resource
    #[error("Not allowed to {action} {resource}")]
    Forbidden { action: Operation, resource: String },

    /// Malformed request that is not tied to a single field
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Store operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Uniform error body used for every non field-scoped failure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    /// Canonical reason phrase of the status code, e.g. "Unauthorized"
    pub error: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::DuplicateEmail | Error::InvalidCredentials | Error::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { errors } => errors.to_string(),
            Error::DuplicateEmail => DUPLICATE_EMAIL_MESSAGE.to_string(),
            Error::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            Error::Unauthenticated => "Authentication required".to_string(),
            Error::Forbidden { action, resource } => format!("You are not authorized to {action} this {resource}"),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, .. } => format!("{resource} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::Other(_) => "Internal server error".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }

    /// The uniform `{statusCode, message, error}` body for this error.
    pub fn body(&self) -> ErrorBody {
        let status = self.status_code();
        ErrorBody {
            status_code: status.as_u16(),
            message: self.user_message(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated | Error::Forbidden { .. } | Error::InvalidCredentials => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Validation { .. } | Error::DuplicateEmail | Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match self {
            // Field-scoped failures are rendered as a bare field -> message map
            Error::Validation { errors } => (status, Json(errors)).into_response(),
            Error::DuplicateEmail => (status, Json(FieldErrors::single("email", DUPLICATE_EMAIL_MESSAGE))).into_response(),
            other => (status, Json(other.body())).into_response(),
        }
    }
}

impl From<FieldErrors> for Error {
    fn from(errors: FieldErrors) -> Self {
        Error::Validation { errors }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        let message = match rejection {
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::JsonDataError(_) => "Request body must be a JSON object",
            JsonRejection::MissingJsonContentType(_) => "Expected request with `Content-Type: application/json`",
            _ => "Failed to read request body",
        };
        Error::BadRequest {
            message: message.to_string(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: Error) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_uniform_body_shape() {
        let (status, body) = render(Error::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], "Authentication required");
        assert_eq!(body.as_object().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_forbidden_and_not_found() {
        let (status, body) = render(Error::Forbidden {
            action: Operation::Delete,
            resource: "post".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");
        assert_eq!(body["message"], "You are not authorized to delete this post");

        let (status, body) = render(Error::NotFound {
            resource: "Post".to_string(),
            id: "abc".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Post not found");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_field_scoped() {
        let (status, body) = render(Error::DuplicateEmail).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "email": "Email already exists" }));
    }

    #[tokio::test]
    async fn test_invalid_credentials_is_uniform() {
        let (status, body) = render(Error::InvalidCredentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["message"], INVALID_CREDENTIALS_MESSAGE);
    }

    #[tokio::test]
    async fn test_validation_renders_field_map() {
        let mut errors = FieldErrors::default();
        errors.insert("title", "Title is required");
        errors.insert("category", "Category must be one of Education, Sport, Politics");
        let (status, body) = render(Error::Validation { errors }).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["title"], "Title is required");
        assert!(body.get("category").is_some());
        assert!(body.get("statusCode").is_none());
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak() {
        let (status, body) = render(Error::Other(anyhow::anyhow!("connection refused to 10.0.0.3"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}

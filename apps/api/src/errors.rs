use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::buyers::csv::CsvRowError;
use crate::email::EmailError;
use crate::validation::FieldErrors;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: FieldErrors,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Failed to parse CSV file")]
    CsvParse(Vec<CsvRowError>),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>, details: FieldErrors) -> Self {
        AppError::Validation {
            message: message.into(),
            details,
        }
    }
}

/// Malformed or non-JSON request bodies.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                message.clone(),
                Some(json!(details)),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None),
            AppError::CsvParse(rows) => (
                StatusCode::BAD_REQUEST,
                "CSV_PARSE_ERROR",
                self.to_string(),
                Some(json!(rows)),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                None,
            ),
            AppError::InvalidToken => (
                StatusCode::BAD_REQUEST,
                "INVALID_TOKEN",
                self.to_string(),
                None,
            ),
            AppError::TokenExpired => (
                StatusCode::BAD_REQUEST,
                "TOKEN_EXPIRED",
                self.to_string(),
                None,
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Email(e) => {
                tracing::error!("Email error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EMAIL_ERROR",
                    "Failed to send magic link. Please check your email configuration.".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_includes_field_details() {
        let mut details = FieldErrors::new();
        details.insert("email".into(), vec!["Please enter a valid email address".into()]);
        let resp = AppError::validation("Invalid buyer data", details).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "Invalid buyer data");
        assert_eq!(
            json["error"]["details"]["email"][0],
            "Please enter a valid email address"
        );
    }

    #[tokio::test]
    async fn test_not_found() {
        let resp = AppError::NotFound("Buyer not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["message"], "Buyer not found");
        assert!(json["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let resp = AppError::Unauthorized.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_token_errors_are_distinct() {
        let invalid = body_json(AppError::InvalidToken.into_response()).await;
        let expired = body_json(AppError::TokenExpired.into_response()).await;
        assert_eq!(invalid["error"]["message"], "Invalid or expired token");
        assert_eq!(expired["error"]["message"], "Token has expired");
    }

    #[tokio::test]
    async fn test_csv_parse_lists_rows() {
        let rows = vec![CsvRowError {
            line: 3,
            message: "found record with 2 fields".into(),
        }];
        let resp = AppError::CsvParse(rows).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["details"][0]["line"], 3);
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let resp = AppError::Internal(anyhow::anyhow!("connection refused on 10.0.0.5")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["message"], "An internal server error occurred");
        assert!(!json.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_email_failure_is_500() {
        let resp = AppError::Email(EmailError::SendFailed("smtp down".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"]["code"], "EMAIL_ERROR");
    }
}

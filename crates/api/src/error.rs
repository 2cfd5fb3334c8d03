use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::study_record::SubmissionError;
use domain::services::image_store::ImageStoreError;
use domain::services::ledger::LedgerError;
use persistence::repositories::LedgerStoreError;
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation failures.
    #[error("Validation error: {0}")]
    InvalidFields(String, Vec<ValidationDetail>),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg, None),
            ApiError::InvalidFields(msg, details) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg,
                Some(details),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = ErrorBody {
            error,
            message,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => ApiError::Conflict("Resource already exists".into()),
                Some("23503") => ApiError::NotFound("Referenced resource not found".into()),
                // CHECK violations guard balances and counters.
                Some("23514") => ApiError::Conflict(format!(
                    "Constraint violated: {}",
                    db_err.constraint().unwrap_or("check")
                )),
                _ => ApiError::Internal(format!("Database error: {}", db_err)),
            },
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = match details.as_slice() {
            [single] => single.message.clone(),
            _ => format!("{} validation errors", details.len()),
        };

        ApiError::InvalidFields(message, details)
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Fields(errors) => errors.into(),
            SubmissionError::Rule(rule) => ApiError::Validation(
                rule.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| rule.code.to_string()),
            ),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidDuration(msg) => ApiError::Validation(msg),
            LedgerError::NegativeBalance { .. } => ApiError::Conflict(err.to_string()),
            LedgerError::InconsistentRecord(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<LedgerStoreError> for ApiError {
    fn from(err: LedgerStoreError) -> Self {
        match err {
            LedgerStoreError::Database(e) => e.into(),
            LedgerStoreError::Ledger(e) => e.into(),
        }
    }
}

impl From<ImageStoreError> for ApiError {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::Storage(msg) => ApiError::ServiceUnavailable(msg),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<shared::jwt::JwtError> for ApiError {
    fn from(err: shared::jwt::JwtError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::WeakPassword(msg) => ApiError::Validation(msg),
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::UserNotFound => ApiError::Unauthorized(err.to_string()),
            AuthError::Token(e) => ApiError::Internal(format!("Token error: {}", e)),
            AuthError::Password(e) => ApiError::Internal(format!("Password error: {}", e)),
            AuthError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidFields("x".into(), vec![]), StatusCode::BAD_REQUEST),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::Forbidden("only the creator".into()).to_string(),
            "Forbidden: only the creator"
        );
        assert_eq!(
            ApiError::Conflict("group is full".into()).to_string(),
            "Conflict: group is full"
        );
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, ApiError::NotFound(_)));
    }

    #[test]
    fn test_from_validation_errors_keeps_details() {
        let request = domain::models::comment::CreateCommentRequest {
            text: "   ".to_string(),
        };
        let error: ApiError = request.validate().unwrap_err().into();
        match error {
            ApiError::InvalidFields(_, details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "text");
            }
            other => panic!("Expected InvalidFields, got {:?}", other),
        }
    }

    #[test]
    fn test_from_ledger_errors() {
        let negative: ApiError = LedgerError::NegativeBalance {
            balance: 10,
            delta: -20,
        }
        .into();
        assert!(matches!(negative, ApiError::Conflict(_)));

        let duration: ApiError = LedgerError::InvalidDuration("zero".into()).into();
        assert!(matches!(duration, ApiError::Validation(_)));

        let wrapped: ApiError = LedgerStoreError::Database(sqlx::Error::RowNotFound).into();
        assert!(matches!(wrapped, ApiError::NotFound(_)));
    }

    #[test]
    fn test_from_auth_errors() {
        let dup: ApiError = AuthError::EmailAlreadyExists.into();
        assert!(matches!(dup, ApiError::Conflict(_)));
        let creds: ApiError = AuthError::InvalidCredentials.into();
        assert!(matches!(creds, ApiError::Unauthorized(_)));
        let weak: ApiError = AuthError::WeakPassword("needs a digit".into()).into();
        assert!(matches!(weak, ApiError::Validation(m) if m == "needs a digit"));
    }

    #[test]
    fn test_from_image_errors() {
        let bad: ApiError = ImageStoreError::UnsupportedFormat.into();
        assert!(matches!(bad, ApiError::Validation(_)));
        let down: ApiError = ImageStoreError::Storage("disk full".into()).into();
        assert!(matches!(down, ApiError::ServiceUnavailable(_)));
    }
}

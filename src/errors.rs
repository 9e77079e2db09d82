// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Comprehensive error enum for all possible failures
/// Each variant maps to appropriate HTTP status code and error response
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden access")]
    Forbidden,

    #[error("Internal server error")]
    #[allow(dead_code)]
    InternalError,

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Service temporarily unavailable")]
    #[allow(dead_code)]
    ServiceUnavailable,
}

impl DirectoryError {
    /// Machine-readable code carried in the JSON body
    pub fn code(&self) -> &'static str {
        match self {
            DirectoryError::NotFound(_) => "NOT_FOUND",
            DirectoryError::AlreadyExists(_) => "ALREADY_EXISTS",
            DirectoryError::DatabaseError(_) => "DATABASE_ERROR",
            DirectoryError::InvalidInput(_) => "INVALID_INPUT",
            DirectoryError::ValidationError(_) => "VALIDATION_ERROR",
            DirectoryError::Unauthorized => "UNAUTHORIZED",
            DirectoryError::Forbidden => "FORBIDDEN",
            DirectoryError::InternalError => "INTERNAL_ERROR",
            DirectoryError::ExternalApiError(_) => "EXTERNAL_API_ERROR",
            DirectoryError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            DirectoryError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// Map a sqlx failure onto the directory error space
    /// DOCUMENTATION: Unique violations become 409, foreign key violations become 400
    pub fn from_db(context: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    log::warn!("{}: duplicate record ({})", context, db_err.message());
                    return DirectoryError::AlreadyExists(context.to_string());
                }
                Some("23503") => {
                    log::warn!("{}: broken reference ({})", context, db_err.message());
                    return DirectoryError::InvalidInput(format!(
                        "{}: related record is missing or still in use",
                        context
                    ));
                }
                _ => {}
            }
        }

        log::error!("{}: {}", context, err);
        DirectoryError::DatabaseError(err.to_string())
    }
}

/// Convert DirectoryError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for DirectoryError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
            DirectoryError::AlreadyExists(_) => StatusCode::CONFLICT,
            DirectoryError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DirectoryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DirectoryError::ValidationError(_) => StatusCode::BAD_REQUEST,
            DirectoryError::Unauthorized => StatusCode::UNAUTHORIZED,
            DirectoryError::Forbidden => StatusCode::FORBIDDEN,
            DirectoryError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            DirectoryError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            DirectoryError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            DirectoryError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<validator::ValidationErrors> for DirectoryError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DirectoryError::ValidationError(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DirectoryError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DirectoryError::AlreadyExists("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            DirectoryError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(DirectoryError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_non_database_sqlx_error_maps_to_database_error() {
        let err = DirectoryError::from_db("Fetch business", sqlx::Error::RowNotFound);
        assert_eq!(err.code(), "DATABASE_ERROR");
    }

    #[derive(Debug, Error)]
    #[error("{message}")]
    struct PgFailure {
        code: &'static str,
        message: String,
    }

    impl sqlx::error::DatabaseError for PgFailure {
        fn message(&self) -> &str {
            &self.message
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn pg_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgFailure {
            code,
            message: format!("violation {}", code),
        }))
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err = DirectoryError::from_db("Create claim", pg_error("23505"));
        assert_eq!(err.code(), "ALREADY_EXISTS");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_foreign_key_violation_maps_to_bad_request() {
        let err = DirectoryError::from_db("Create business", pg_error("23503"));
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_other_database_codes_stay_internal() {
        let err = DirectoryError::from_db("Update business", pg_error("40001"));
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_rt::test]
    async fn test_error_body_shape() {
        let response = DirectoryError::Forbidden.error_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "FORBIDDEN");
        assert!(body["error"]["timestamp"].is_string());
    }
}

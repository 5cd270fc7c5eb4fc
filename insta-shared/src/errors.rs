use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{domain}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Identity errors
/// - E2xxx: User and follow errors
/// - E3xxx: Post errors
/// - E4xxx: Comment errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    ServiceUnavailable,
    BadRequest,
    Conflict,

    // Identity (E1xxx)
    TokenExpired,
    TokenInvalid,

    // User (E2xxx)
    UserNotFound,
    UsernameTaken,
    FollowAlreadyExists,
    FollowNotFound,
    CannotFollowSelf,

    // Post (E3xxx)
    PostNotFound,
    NotPostOwner,

    // Comment (E4xxx)
    CommentNotFound,
    NotCommentAuthor,
    ParentCommentMismatch,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::ServiceUnavailable => "E0006",
            Self::BadRequest => "E0007",
            Self::Conflict => "E0008",

            // Identity
            Self::TokenExpired => "E1001",
            Self::TokenInvalid => "E1002",

            // User
            Self::UserNotFound => "E2001",
            Self::UsernameTaken => "E2002",
            Self::FollowAlreadyExists => "E2003",
            Self::FollowNotFound => "E2004",
            Self::CannotFollowSelf => "E2005",

            // Post
            Self::PostNotFound => "E3001",
            Self::NotPostOwner => "E3002",

            // Comment
            Self::CommentNotFound => "E4001",
            Self::NotCommentAuthor => "E4002",
            Self::ParentCommentMismatch => "E4003",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::ParentCommentMismatch => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::UserNotFound | Self::FollowNotFound
            | Self::PostNotFound | Self::CommentNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::CannotFollowSelf | Self::NotPostOwner
            | Self::NotCommentAuthor => StatusCode::FORBIDDEN,
            Self::Conflict | Self::UsernameTaken | Self::FollowAlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) => ErrorCode::InternalError,
            AppError::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            AppError::Database(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                ErrorCode::Conflict
            }
            AppError::Database(diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                ErrorCode::NotFound
            }
            AppError::Database(_) => ErrorCode::InternalError,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or(serde_json::Value::Null);
        Self::with_details(ErrorCode::ValidationError, "request validation failed", details)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => match err {
                diesel::result::Error::NotFound => (
                    StatusCode::NOT_FOUND,
                    ApiErrorResponse::new("E0003", "resource not found"),
                ),
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                    tracing::warn!(constraint = ?info.constraint_name(), "unique constraint violated");
                    (
                        StatusCode::CONFLICT,
                        ApiErrorResponse::new("E0008", "resource already exists"),
                    )
                }
                // The referenced row (author, post, parent) was deleted
                // between authentication and the write.
                diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                    tracing::warn!(constraint = ?info.constraint_name(), "foreign key violated");
                    (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "referenced resource not found"),
                    )
                }
                _ => {
                    tracing::error!(error = %err, "database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    )
                }
            },
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

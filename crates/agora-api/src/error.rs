//! Error taxonomy shared by the stores and the HTTP handlers.

use axum::{
    Json,
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

use agora_types::api::MessageResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing, empty or malformed.
    #[error("validation failed: {0}")]
    Validation(&'static str),

    #[error("comment content is blank")]
    EmptyContent,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid password")]
    InvalidPassword,

    /// Missing session, or a session without the required role.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("comment not found")]
    NotFound,

    /// Database failure. The context chain names the operation and key.
    #[error("persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::EmptyContent | Self::DuplicateUsername | Self::UserNotFound => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidPassword | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `message` field of the response body.
    /// Unknown user and wrong password read the same to avoid user enumeration.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::Validation(msg) | Self::Unauthorized(msg) => *msg,
            Self::EmptyContent => "Comment cannot be empty",
            Self::DuplicateUsername => "Username already exists",
            Self::UserNotFound | Self::InvalidPassword => "Invalid username or password",
            Self::NotFound => "Comment does not exist",
            Self::Persistence(_) | Self::Internal(_) => "Internal server error",
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        debug!("Rejected form body: {}", rejection);
        Self::Validation("Invalid form data")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }

        (status, Json(MessageResponse::new(self.client_message()))).into_response()
    }
}

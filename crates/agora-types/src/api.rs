use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Role;

// -- Session claims --

/// Claims carried by the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Username of the authenticated account.
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

// Form fields default to empty so a missing field is reported as a
// validation error rather than a decoding failure.

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub role: Role,
}

// -- Comments --

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub comment: String,
}

/// `id` stays a string so a non-numeric value can be answered with a
/// validation message instead of a decoding failure.
#[derive(Debug, Deserialize)]
pub struct DeleteCommentForm {
    #[serde(default)]
    pub id: String,
}

/// A comment joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// -- Envelope --

/// `{"message": ...}` body used by every non-list response, errors included.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

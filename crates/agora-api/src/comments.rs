use std::sync::Arc;

use anyhow::Context;
use axum::{Form, Json, extract::State};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use agora_db::Database;
use agora_db::models::CommentRow;
use agora_types::api::{CommentForm, CommentView, DeleteCommentForm, MessageResponse};

use crate::error::ApiError;
use crate::session::SessionIdentity;
use crate::{AppState, run_blocking};

/// Comment persistence. Deletion is not role-checked here; handlers do that.
pub struct CommentStore {
    db: Arc<Database>,
}

impl CommentStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn add(&self, user_id: i64, content: &str) -> Result<(), ApiError> {
        if content.trim().is_empty() {
            return Err(ApiError::EmptyContent);
        }

        let id = self
            .db
            .insert_comment(user_id, content)
            .with_context(|| format!("inserting comment for user {}", user_id))?;

        info!("User {} posted comment {}", user_id, id);
        Ok(())
    }

    /// All comments, newest first.
    pub fn list(&self) -> Result<Vec<CommentView>, ApiError> {
        let rows = self.db.list_comments().context("listing comments")?;
        Ok(rows.into_iter().map(to_view).collect())
    }

    pub fn delete(&self, comment_id: i64) -> Result<(), ApiError> {
        let deleted = self
            .db
            .delete_comment(comment_id)
            .with_context(|| format!("deleting comment {}", comment_id))?;

        if !deleted {
            return Err(ApiError::NotFound);
        }

        info!("Deleted comment {}", comment_id);
        Ok(())
    }
}

fn to_view(row: CommentRow) -> CommentView {
    let created_at = row
        .created_at
        .parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // Rows written outside the app may use SQLite's "YYYY-MM-DD HH:MM:SS".
            chrono::NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on comment {}: {}", row.created_at, row.id, e);
            chrono::DateTime::default()
        });

    CommentView {
        id: row.id,
        user_id: row.user_id,
        username: row.username,
        content: row.content,
        created_at,
    }
}

// -- Handlers --

/// GET /comments
pub async fn list_comments(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let comments = run_blocking(&state, |state| state.comments.list()).await?;
    Ok(Json(comments))
}

/// POST /comments — form field `comment`, session required.
pub async fn add_comment(
    State(state): State<AppState>,
    session: SessionIdentity,
    WithRejection(Form(form), _): WithRejection<Form<CommentForm>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    run_blocking(&state, move |state| {
        // A valid token for an account that no longer exists is no login at all.
        let user_id = state
            .credentials
            .lookup_id(&session.username)
            .map_err(|e| match e {
                ApiError::UserNotFound => ApiError::Unauthorized("Login required"),
                other => other,
            })?;
        state.comments.add(user_id, &form.comment)
    })
    .await?;

    Ok(Json(MessageResponse::new("Comment added successfully")))
}

/// POST /delete-comment — form field `id`, admin session required.
pub async fn delete_comment(
    State(state): State<AppState>,
    session: SessionIdentity,
    WithRejection(Form(form), _): WithRejection<Form<DeleteCommentForm>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    session.require_admin().inspect_err(|_| {
        warn!("User '{}' attempted to delete a comment without admin role", session.username);
    })?;

    let raw_id = form.id.trim();
    if raw_id.is_empty() {
        return Err(ApiError::Validation("Comment ID required"));
    }
    let comment_id: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::Validation("Invalid comment ID"))?;

    run_blocking(&state, move |state| state.comments.delete(comment_id)).await?;

    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

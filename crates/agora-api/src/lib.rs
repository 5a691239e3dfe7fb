pub mod auth;
pub mod comments;
pub mod credentials;
pub mod error;
pub mod session;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::error;

use agora_db::Database;

use crate::comments::CommentStore;
use crate::credentials::CredentialStore;
use crate::error::ApiError;
use crate::session::SessionManager;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub credentials: CredentialStore,
    pub comments: CommentStore,
    pub sessions: SessionManager,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, sessions: SessionManager) -> AppState {
        Arc::new(Self {
            credentials: CredentialStore::new(db.clone()),
            comments: CommentStore::new(db),
            sessions,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route(
            "/comments",
            get(comments::list_comments).post(comments::add_comment),
        )
        .route("/delete-comment", post(comments::delete_comment))
        .with_state(state)
}

/// Run blocking store work (SQLite, password hashing) off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
}

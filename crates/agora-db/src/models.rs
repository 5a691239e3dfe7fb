/// Database row types — these map directly to SQLite rows.
/// Distinct from agora-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

/// A comment joined with its author's username.
pub struct CommentRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: String,
}

use crate::models::{CommentRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode};

impl Database {
    // -- Users --

    /// Insert a user with the default role.
    /// Returns the new id, or `None` when the username is already taken.
    /// The UNIQUE constraint decides, so concurrent registrations cannot both win.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                (username, password_hash),
            ) {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_id(&self, username: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT id FROM users WHERE username = ?1", [username], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    /// Returns false if no such user exists.
    pub fn set_user_role(&self, username: &str, role: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET role = ?1 WHERE username = ?2",
                (role, username),
            )?;
            Ok(updated > 0)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, user_id: i64, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (user_id, content) VALUES (?1, ?2)",
                rusqlite::params![user_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Every comment with its author, newest first.
    pub fn list_comments(&self) -> Result<Vec<CommentRow>> {
        self.with_conn(query_comments)
    }

    /// Returns false if no comment had that id.
    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                role: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_comments(conn: &Connection) -> Result<Vec<CommentRow>> {
    // id breaks ties between comments stored within the same millisecond
    let mut stmt = conn.prepare(
        "SELECT c.id, c.user_id, u.username, c.content, c.created_at
         FROM comments c
         JOIN users u ON c.user_id = u.id
         ORDER BY c.created_at DESC, c.id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(CommentRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                username: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA";

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn duplicate_username_is_reported_as_none() {
        let db = db();
        assert!(db.create_user("alice", HASH).unwrap().is_some());
        assert!(db.create_user("alice", HASH).unwrap().is_none());
    }

    #[test]
    fn new_users_get_the_user_role() {
        let db = db();
        let id = db.create_user("alice", HASH).unwrap().unwrap();

        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, "user");
        assert_eq!(user.password_hash, HASH);
        assert!(!user.created_at.is_empty());

        assert_eq!(db.get_user_id("alice").unwrap(), Some(id));
        assert_eq!(db.get_user_id("nobody").unwrap(), None);
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn set_user_role_only_touches_existing_users() {
        let db = db();
        db.create_user("alice", HASH).unwrap();

        assert!(db.set_user_role("alice", "admin").unwrap());
        assert!(!db.set_user_role("mallory", "admin").unwrap());
        assert_eq!(db.get_user_by_username("alice").unwrap().unwrap().role, "admin");
    }

    #[test]
    fn comments_list_newest_first_with_author() {
        let db = db();
        let alice = db.create_user("alice", HASH).unwrap().unwrap();
        let bob = db.create_user("bob", HASH).unwrap().unwrap();

        let first = db.insert_comment(alice, "first").unwrap();
        let second = db.insert_comment(bob, "second").unwrap();

        let rows = db.list_comments().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second);
        assert_eq!(rows[0].username, "bob");
        assert_eq!(rows[0].user_id, bob);
        assert_eq!(rows[1].id, first);
        assert_eq!(rows[1].content, "first");
    }

    #[test]
    fn comment_requires_existing_user() {
        let db = db();
        assert!(db.insert_comment(42, "orphan").is_err());
        assert!(db.list_comments().unwrap().is_empty());
    }

    #[test]
    fn blank_comment_is_rejected_by_schema() {
        let db = db();
        let alice = db.create_user("alice", HASH).unwrap().unwrap();
        assert!(db.insert_comment(alice, "   ").is_err());
    }

    #[test]
    fn delete_reports_missing_comment() {
        let db = db();
        let alice = db.create_user("alice", HASH).unwrap().unwrap();
        let id = db.insert_comment(alice, "bye").unwrap();

        assert!(!db.delete_comment(id + 1).unwrap());
        assert!(db.delete_comment(id).unwrap());
        assert!(!db.delete_comment(id).unwrap());
        assert!(db.list_comments().unwrap().is_empty());
    }
}

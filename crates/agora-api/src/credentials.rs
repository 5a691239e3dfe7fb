use std::sync::Arc;

use anyhow::{Context, anyhow};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use tracing::{info, warn};

use agora_db::Database;
use agora_types::models::Role;

use crate::error::ApiError;

/// Usernames, password hashes and roles.
///
/// Every method blocks (SQLite, Argon2); call from `spawn_blocking`.
pub struct CredentialStore {
    db: Arc<Database>,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let password_hash = hash_password(password)?;

        let user_id = self
            .db
            .create_user(username, &password_hash)
            .with_context(|| format!("creating user '{}'", username))?
            .ok_or(ApiError::DuplicateUsername)?;

        info!("Registered user '{}' (id {})", username, user_id);
        Ok(())
    }

    /// Check a password against the stored hash and return the user's role.
    pub fn verify(&self, username: &str, password: &str) -> Result<Role, ApiError> {
        let user = self
            .db
            .get_user_by_username(username)
            .with_context(|| format!("loading user '{}'", username))?
            .ok_or(ApiError::UserNotFound)?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow!("stored hash for user '{}' is unreadable: {}", username, e))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::InvalidPassword)?;

        Ok(user.role.parse().unwrap_or_else(|e| {
            warn!("User '{}' has {}, treating as 'user'", username, e);
            Role::User
        }))
    }

    pub fn lookup_id(&self, username: &str) -> Result<i64, ApiError> {
        self.db
            .get_user_id(username)
            .with_context(|| format!("looking up id of user '{}'", username))?
            .ok_or(ApiError::UserNotFound)
    }
}

/// Argon2id with a fresh random salt, in PHC string form.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "your-very-secure-key",
    "dev-secret-change-me",
];

/// Longest accepted session lifetime: one year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// `None` means generate a per-process key.
    pub session_secret: Option<String>,
    pub session_ttl: chrono::Duration,
    /// Usernames promoted to admin at startup.
    pub admins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let port: u16 = var("AGORA_PORT", "8080")
            .parse()
            .context("AGORA_PORT must be a port number")?;
        let session_ttl_hours: i64 = var("AGORA_SESSION_TTL_HOURS", "720")
            .parse()
            .context("AGORA_SESSION_TTL_HOURS must be a whole number of hours")?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
            bail!(
                "AGORA_SESSION_TTL_HOURS must be between 1 and {} (got {})",
                MAX_SESSION_TTL_HOURS,
                session_ttl_hours
            );
        }
        let session_ttl = chrono::Duration::try_hours(session_ttl_hours)
            .context("AGORA_SESSION_TTL_HOURS is out of range")?;

        let session_secret = lookup("AGORA_SESSION_SECRET").filter(|s| !s.is_empty());
        if let Some(secret) = &session_secret {
            if PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
                bail!("AGORA_SESSION_SECRET is still a placeholder; set a random value");
            }
        }

        let admins = var("AGORA_ADMINS", "")
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            host: var("AGORA_HOST", "0.0.0.0"),
            port,
            db_path: var("AGORA_DB_PATH", "agora.db").into(),
            session_secret,
            session_ttl,
            admins,
        })
    }
}

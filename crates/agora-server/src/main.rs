mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use agora_api::AppStateInner;
use agora_api::session::SessionManager;
use agora_db::Database;
use agora_types::models::Role;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "agora=debug,agora_api=debug,agora_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);
    promote_admins(&db, &config.admins)?;

    let secret = match &config.session_secret {
        Some(secret) => secret.as_bytes().to_vec(),
        None => {
            warn!("AGORA_SESSION_SECRET is unset; sessions will not survive a restart");
            SessionManager::generate_secret().to_vec()
        }
    };
    let sessions = SessionManager::new(&secret, config.session_ttl);

    let app = agora_api::router(AppStateInner::new(db, sessions))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Agora server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Admin is never granted over HTTP; operators name admins in AGORA_ADMINS.
fn promote_admins(db: &Database, admins: &[String]) -> anyhow::Result<()> {
    for username in admins {
        if db.set_user_role(username, Role::Admin.as_str())? {
            info!("Granted admin role to '{}'", username);
        } else {
            warn!("AGORA_ADMINS names unknown user '{}', skipping", username);
        }
    }
    Ok(())
}

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use agora_types::api::SessionClaims;
use agora_types::models::Role;

use crate::AppState;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "agora_session";

/// Identity proven by a valid session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub username: String,
    pub role: Role,
}

impl SessionIdentity {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Admin privileges required"))
        }
    }
}

/// Issues and checks HS256-signed session tokens.
/// The key is fixed for the lifetime of the process.
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl SessionManager {
    pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Random 256-bit signing key, for when none is configured.
    pub fn generate_secret() -> [u8; 32] {
        rand::random()
    }

    pub fn create(&self, username: &str, role: Role) -> Result<String, ApiError> {
        let expires = chrono::Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Internal(format!("session ttl {} overflows", self.ttl)))?;
        let claims = SessionClaims {
            sub: username.to_string(),
            role,
            exp: expires.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("signing session token: {}", e)))
    }

    /// `None` for malformed, forged or expired tokens.
    pub fn validate(&self, token: &str) -> Option<SessionIdentity> {
        match decode::<SessionClaims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(SessionIdentity {
                username: data.claims.sub,
                role: data.claims.role,
            }),
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }

    pub fn read_cookie(&self, jar: &CookieJar) -> Option<SessionIdentity> {
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| self.validate(cookie.value()))
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

impl FromRequestParts<AppState> for SessionIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        state
            .sessions
            .read_cookie(&jar)
            .ok_or(ApiError::Unauthorized("Login required"))
    }
}

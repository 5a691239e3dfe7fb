use axum::{Form, Json, extract::State};
use axum_extra::extract::{CookieJar, WithRejection};
use tracing::{info, warn};

use agora_types::api::{LoginForm, LoginResponse, MessageResponse, RegisterForm};

use crate::error::ApiError;
use crate::{AppState, run_blocking};

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Form(req), _): WithRejection<Form<RegisterForm>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("Username and password required"));
    }

    info!("Registering username '{}'", req.username);

    run_blocking(&state, move |state| {
        state.credentials.register(&req.username, &req.password)
    })
    .await?;

    Ok(Json(MessageResponse::new("Registration successful")))
}

/// POST /login — on success the session cookie is set on the response.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Form(req), _): WithRejection<Form<LoginForm>, ApiError>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("Username and password required"));
    }

    let username = req.username;
    let password = req.password;
    let who = username.clone();
    let role = run_blocking(&state, move |state| state.credentials.verify(&who, &password))
        .await
        .inspect_err(|e| warn!("Login failed for '{}': {}", username, e))?;

    let token = state.sessions.create(&username, role)?;
    info!("User '{}' logged in as {}", username, role);

    Ok((
        jar.add(state.sessions.cookie(token)),
        Json(LoginResponse {
            message: "Login successful".into(),
            role,
        }),
    ))
}

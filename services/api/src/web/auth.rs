//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: login, registration, logout, and the current
//! session. Passwords are accepted but never verified; there is no
//! credential layer in this trust model.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use lumina_core::Account;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::rest::AccountResponse;
use crate::web::state::{AppState, Stores};
use crate::web::port_error;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Authenticate by email, auto-provisioning unknown ones
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AccountResponse),
        (status = 403, description = "Account disabled"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    let Stores {
        directory, session, ..
    } = &mut *stores;

    let account = session
        .login(directory, &req.email, &req.password)
        .await
        .map_err(|e| {
            error!("Login failed for {}: {e}", req.email);
            port_error(e)
        })?;

    Ok((StatusCode::OK, Json(AccountResponse::from(&account))))
}

/// POST /auth/register - Create a new account and log it in
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    let Stores {
        directory, session, ..
    } = &mut *stores;

    let account = session
        .register(directory, &req.email, &req.name, &req.password)
        .await
        .map_err(|e| {
            error!("Registration failed for {}: {e}", req.email);
            port_error(e)
        })?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// POST /auth/logout - Clear the session; safe to call repeatedly
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    stores.session.logout().await.map_err(|e| {
        error!("Logout failed: {e}");
        port_error(e)
    })?;
    Ok(StatusCode::OK)
}

/// GET /auth/me - The current session's account
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn me_handler(Extension(account): Extension<Account>) -> Json<AccountResponse> {
    Json(AccountResponse::from(&account))
}

//! services/api/src/web/profile.rs
//!
//! Self-service profile endpoints: display name and study-hour updates plus
//! the premium upgrade/downgrade pair. Each writes both the session snapshot
//! and the roster record.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::port_error;
use crate::web::rest::AccountResponse;
use crate::web::state::{AppState, Stores};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: String,
    pub study_hours_per_day: f64,
}

fn current_response(stores: &Stores) -> Result<Json<AccountResponse>, (StatusCode, String)> {
    stores
        .session
        .current()
        .map(|account| Json(AccountResponse::from(account)))
        .ok_or((StatusCode::UNAUTHORIZED, "No active session".to_string()))
}

/// PUT /profile - Update the current account's name and study hours
#[utoipa::path(
    put,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AccountResponse),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    let Stores {
        directory, session, ..
    } = &mut *stores;

    session
        .update_profile(directory, &req.name, req.study_hours_per_day)
        .await
        .map_err(|e| {
            error!("Profile update failed: {e}");
            port_error(e)
        })?;

    current_response(&stores)
}

/// POST /profile/premium - Switch the current account to the premium role
#[utoipa::path(
    post,
    path = "/profile/premium",
    responses(
        (status = 200, description = "Upgraded to premium", body = AccountResponse),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upgrade_premium_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    let Stores {
        directory, session, ..
    } = &mut *stores;

    session.upgrade_to_premium(directory).await.map_err(|e| {
        error!("Premium upgrade failed: {e}");
        port_error(e)
    })?;

    current_response(&stores)
}

/// DELETE /profile/premium - Drop premium back to the user role
///
/// A no-op when the current role is anything other than premium.
#[utoipa::path(
    delete,
    path = "/profile/premium",
    responses(
        (status = 200, description = "Premium cancelled (or nothing to cancel)", body = AccountResponse),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn cancel_premium_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    let Stores {
        directory, session, ..
    } = &mut *stores;

    session.cancel_premium(directory).await.map_err(|e| {
        error!("Premium cancellation failed: {e}");
        port_error(e)
    })?;

    current_response(&stores)
}

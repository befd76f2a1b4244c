//! services/api/src/web/users.rs
//!
//! Account administration endpoints. The admin surface changes roles and
//! status; the moderator surface reviews the roster and flags accounts. The
//! route gates in `middleware.rs` keep unprivileged callers out, and every
//! mutation here still passes the actor's role into the directory, which
//! re-checks it before acting.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use lumina_core::domain::{Account, AccountStatus, UserRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::port_error;
use crate::web::rest::AccountResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Roster-wide counts shown above the admin and moderator tables.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterMetrics {
    pub total_users: usize,
    pub premium_users: usize,
    pub admins: usize,
    pub active_users: usize,
    pub flagged_users: usize,
}

impl RosterMetrics {
    fn from_roster(accounts: &[Account]) -> Self {
        Self {
            total_users: accounts.len(),
            premium_users: accounts
                .iter()
                .filter(|a| a.role == UserRole::Premium)
                .count(),
            admins: accounts.iter().filter(|a| a.role == UserRole::Admin).count(),
            active_users: accounts
                .iter()
                .filter(|a| a.status == AccountStatus::Active)
                .count(),
            flagged_users: accounts.iter().filter(|a| a.is_flagged).count(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterResponse {
    pub users: Vec<AccountResponse>,
    pub metrics: RosterMetrics,
}

impl RosterResponse {
    fn from_roster(accounts: &[Account]) -> Self {
        Self {
            users: accounts.iter().map(AccountResponse::from).collect(),
            metrics: RosterMetrics::from_roster(accounts),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RoleChangeRequest {
    #[schema(value_type = String, example = "moderator")]
    pub role: UserRole,
}

//=========================================================================================
// Admin Handlers
//=========================================================================================

/// GET /admin/users - The full roster with admin metrics
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Roster and metrics", body = RosterResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn admin_roster_handler(State(state): State<Arc<AppState>>) -> Json<RosterResponse> {
    let stores = state.stores.lock().await;
    Json(RosterResponse::from_roster(stores.directory.accounts()))
}

/// PUT /admin/users/{id}/role - Assign a role to the target account
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = String, Path, description = "Target account id")),
    request_body = RoleChangeRequest,
    responses(
        (status = 204, description = "Role assigned (unknown ids are ignored)"),
        (status = 403, description = "Actor is not an admin"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_role_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Account>,
    Path(id): Path<String>,
    Json(req): Json<RoleChangeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    stores
        .directory
        .set_role(actor.role, &id, req.role)
        .await
        .map_err(|e| {
            error!("Role change for {id} failed: {e}");
            port_error(e)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/users/{id}/status - Flip the target between active and disabled
#[utoipa::path(
    post,
    path = "/admin/users/{id}/status",
    params(("id" = String, Path, description = "Target account id")),
    responses(
        (status = 204, description = "Status toggled (unknown ids are ignored)"),
        (status = 403, description = "Actor is not an admin"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Account>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    stores
        .directory
        .toggle_status(actor.role, &id)
        .await
        .map_err(|e| {
            error!("Status toggle for {id} failed: {e}");
            port_error(e)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Moderator Handlers
//=========================================================================================

/// GET /moderator/users - The roster as seen by moderators
#[utoipa::path(
    get,
    path = "/moderator/users",
    responses(
        (status = 200, description = "Roster and metrics", body = RosterResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn moderator_roster_handler(State(state): State<Arc<AppState>>) -> Json<RosterResponse> {
    let stores = state.stores.lock().await;
    Json(RosterResponse::from_roster(stores.directory.accounts()))
}

/// POST /moderator/users/{id}/flag - Flip the target's flag
#[utoipa::path(
    post,
    path = "/moderator/users/{id}/flag",
    params(("id" = String, Path, description = "Target account id")),
    responses(
        (status = 204, description = "Flag toggled (unknown ids are ignored)"),
        (status = 403, description = "Actor is neither moderator nor admin"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_flag_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Account>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    stores
        .directory
        .toggle_flag(actor.role, &id)
        .await
        .map_err(|e| {
            error!("Flag toggle for {id} failed: {e}");
            port_error(e)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

//! services/api/src/web/middleware.rs
//!
//! Route-gating middleware. Routes are partitioned into public,
//! authenticated-any-role, moderator-or-admin, and admin-only; an
//! authenticated account hitting an under-privileged route is redirected to
//! the dashboard rather than shown an error. The gates here are not the only
//! enforcement layer: the directory re-checks the actor's role on every
//! privileged mutation.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use lumina_core::Account;
use std::sync::Arc;

use crate::web::state::AppState;

/// The default authenticated landing route.
const LANDING_ROUTE: &str = "/dashboard";

async fn current_account(state: &AppState) -> Option<Account> {
    state.stores.lock().await.session.current().cloned()
}

/// Middleware that requires a live session.
///
/// If one exists, inserts the session's account into request extensions for
/// handlers to use. If not, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let account = current_account(&state)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(account);
    Ok(next.run(req).await)
}

/// Middleware for moderator-or-admin routes. A logged-out caller gets 401;
/// an authenticated account without the capability is sent to the dashboard.
pub async fn require_moderator(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let account = current_account(&state)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !account.role.is_moderator() {
        return Ok(Redirect::to(LANDING_ROUTE).into_response());
    }

    req.extensions_mut().insert(account);
    Ok(next.run(req).await)
}

/// Middleware for admin-only routes. Same shape as [`require_moderator`]
/// with the stricter capability.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let account = current_account(&state)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !account.role.is_admin() {
        return Ok(Redirect::to(LANDING_ROUTE).into_response());
    }

    req.extensions_mut().insert(account);
    Ok(next.run(req).await)
}

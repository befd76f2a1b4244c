pub mod auth;
pub mod dashboard;
pub mod middleware;
pub mod planner;
pub mod profile;
pub mod rest;
pub mod state;
pub mod users;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use lumina_core::ports::PortError;

pub use middleware::{require_admin, require_auth, require_moderator};
use state::AppState;

/// Maps a core error onto the HTTP surface. Every variant is a
/// recoverable-by-the-caller failure; none abort the process.
pub(crate) fn port_error(err: PortError) -> (StatusCode, String) {
    let status = match &err {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Unauthorized | PortError::AccountDisabled => StatusCode::FORBIDDEN,
        PortError::EmailTaken => StatusCode::CONFLICT,
        PortError::PlanGeneration(_) => StatusCode::BAD_GATEWAY,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Builds the API router with its role-partitioned route groups.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no session required; logout stays public so it is
    // idempotent for callers that already lost their session).
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Routes for any authenticated role.
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/profile", put(profile::update_profile_handler))
        .route(
            "/profile/premium",
            post(profile::upgrade_premium_handler).delete(profile::cancel_premium_handler),
        )
        .route("/dashboard", get(dashboard::dashboard_handler))
        .route(
            "/tasks",
            get(planner::list_tasks_handler).post(planner::create_task_handler),
        )
        .route("/tasks/{id}/toggle", post(planner::toggle_task_handler))
        .route("/tasks/{id}", delete(planner::delete_task_handler))
        .route(
            "/plan",
            get(planner::get_plan_handler).delete(planner::clear_plan_handler),
        )
        .route("/plan/generate", post(planner::generate_plan_handler))
        .route("/reset", post(planner::reset_data_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Moderator + Admin routes.
    let moderator_routes = Router::new()
        .route("/moderator/users", get(users::moderator_roster_handler))
        .route("/moderator/users/{id}/flag", post(users::toggle_flag_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_moderator,
        ));

    // Admin-only routes.
    let admin_routes = Router::new()
        .route("/admin/users", get(users::admin_roster_handler))
        .route("/admin/users/{id}/role", put(users::set_role_handler))
        .route("/admin/users/{id}/status", post(users::toggle_status_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(moderator_routes)
        .merge(admin_routes)
        .with_state(state)
}

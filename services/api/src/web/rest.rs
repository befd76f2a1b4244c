//! services/api/src/web/rest.rs
//!
//! Contains the shared response payloads and the master definition for the
//! OpenAPI specification.

use chrono::{DateTime, Utc};
use lumina_core::domain::{Account, AccountStatus, UserRole};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::login_handler,
        crate::web::auth::register_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::me_handler,
        crate::web::profile::update_profile_handler,
        crate::web::profile::upgrade_premium_handler,
        crate::web::profile::cancel_premium_handler,
        crate::web::dashboard::dashboard_handler,
        crate::web::planner::list_tasks_handler,
        crate::web::planner::create_task_handler,
        crate::web::planner::toggle_task_handler,
        crate::web::planner::delete_task_handler,
        crate::web::planner::get_plan_handler,
        crate::web::planner::generate_plan_handler,
        crate::web::planner::clear_plan_handler,
        crate::web::planner::reset_data_handler,
        crate::web::users::admin_roster_handler,
        crate::web::users::set_role_handler,
        crate::web::users::toggle_status_handler,
        crate::web::users::moderator_roster_handler,
        crate::web::users::toggle_flag_handler,
    ),
    components(schemas(
        AccountResponse,
        crate::web::auth::LoginRequest,
        crate::web::auth::RegisterRequest,
        crate::web::profile::UpdateProfileRequest,
        crate::web::planner::NewTaskRequest,
        crate::web::planner::TaskResponse,
        crate::web::planner::BlockResponse,
        crate::web::planner::PlanResponse,
        crate::web::planner::GeneratePlanRequest,
        crate::web::dashboard::StatsResponse,
        crate::web::dashboard::DashboardResponse,
        crate::web::users::RosterMetrics,
        crate::web::users::RosterResponse,
        crate::web::users::RoleChangeRequest,
    )),
    tags(
        (name = "Lumina API", description = "Study planning, accounts, and role administration.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Response Payloads
//=========================================================================================

/// An account as returned to clients. There is nothing secret to strip; this
/// trust model stores no credentials.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    #[schema(value_type = String, example = "user")]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "active")]
    pub status: AccountStatus,
    pub is_flagged: bool,
    pub study_hours_per_day: f64,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            created_at: account.created_at,
            status: account.status,
            is_flagged: account.is_flagged,
            study_hours_per_day: account.study_hours_per_day,
        }
    }
}

//! services/api/src/web/dashboard.rs
//!
//! The authenticated landing surface: progress stats, the next pending task,
//! and the study blocks scheduled for the current day.

use axum::{extract::State, Extension, Json};
use chrono::{Datelike, Local};
use lumina_core::domain::{Account, Stats, Weekday};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::planner::{BlockResponse, TaskResponse};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub active_plan: bool,
    pub premium_status: bool,
}

impl From<Stats> for StatsResponse {
    fn from(stats: Stats) -> Self {
        Self {
            total_tasks: stats.total_tasks,
            completed_tasks: stats.completed_tasks,
            active_plan: stats.active_plan,
            premium_status: stats.premium_status,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: StatsResponse,
    pub next_task: Option<TaskResponse>,
    pub todays_blocks: Vec<BlockResponse>,
}

/// GET /dashboard - Stats, the next pending task, and today's schedule
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
) -> Json<DashboardResponse> {
    let stores = state.stores.lock().await;
    let tasks = stores.planner.tasks();
    let plan = stores.planner.current_plan();

    let stats = Stats::from_state(tasks, plan, &account);
    let next_task = tasks.iter().find(|t| !t.completed).map(TaskResponse::from);

    let today = Weekday::from_chrono(Local::now().weekday());
    let todays_blocks = plan
        .map(|p| {
            p.blocks
                .iter()
                .filter(|b| b.day == today)
                .map(BlockResponse::from)
                .collect()
        })
        .unwrap_or_default();

    Json(DashboardResponse {
        stats: stats.into(),
        next_task,
        todays_blocks,
    })
}

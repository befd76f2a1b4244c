//! services/api/src/web/planner.rs
//!
//! Task and study-plan endpoints. Plan generation collects the task list's
//! deduplicated subjects, the session's daily-hour budget, and free-text
//! notes, makes one round trip to the generator, and stores the result; a
//! generation failure surfaces as one error with no partial plan applied.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use lumina_core::domain::{
    Account, Difficulty, NewTask, PlanRequest, StudyBlock, StudyPlan, Task, Weekday,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::port_error;
use crate::web::state::{AppState, Stores};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub title: String,
    pub subject: String,
    #[schema(value_type = String, example = "2024-06-21")]
    pub due_date: NaiveDate,
    #[schema(value_type = String, example = "Medium")]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub completed: bool,
    pub priority: u8,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub subject: String,
    #[schema(value_type = String)]
    pub due_date: NaiveDate,
    #[schema(value_type = String)]
    pub difficulty: Difficulty,
    pub completed: bool,
    pub priority: u8,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            subject: task.subject.clone(),
            due_date: task.due_date,
            difficulty: task.difficulty,
            completed: task.completed,
            priority: task.priority,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub id: String,
    #[schema(value_type = String, example = "Monday")]
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub topic: String,
    pub duration_minutes: u32,
}

impl From<&StudyBlock> for BlockResponse {
    fn from(block: &StudyBlock) -> Self {
        Self {
            id: block.id.clone(),
            day: block.day,
            start_time: block.start_time.clone(),
            end_time: block.end_time.clone(),
            subject: block.subject.clone(),
            topic: block.topic.clone(),
            duration_minutes: block.duration_minutes,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub blocks: Vec<BlockResponse>,
}

impl From<&StudyPlan> for PlanResponse {
    fn from(plan: &StudyPlan) -> Self {
        Self {
            id: plan.id.clone(),
            user_id: plan.user_id.clone(),
            title: plan.title.clone(),
            created_at: plan.created_at,
            blocks: plan.blocks.iter().map(BlockResponse::from).collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanRequest {
    /// Defaults to the session account's study-hour budget.
    pub available_hours_per_day: Option<f64>,
    pub notes: Option<String>,
}

//=========================================================================================
// Task Handlers
//=========================================================================================

/// GET /tasks - All tasks in insertion order
#[utoipa::path(
    get,
    path = "/tasks",
    responses(
        (status = 200, description = "Task list", body = [TaskResponse]),
        (status = 401, description = "No active session")
    )
)]
pub async fn list_tasks_handler(State(state): State<Arc<AppState>>) -> Json<Vec<TaskResponse>> {
    let stores = state.stores.lock().await;
    Json(stores.planner.tasks().iter().map(TaskResponse::from).collect())
}

/// POST /tasks - Create a task
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = NewTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTaskRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    let task = stores
        .planner
        .add_task(NewTask {
            title: req.title,
            subject: req.subject,
            due_date: req.due_date,
            difficulty: req.difficulty,
            completed: req.completed,
            priority: req.priority,
        })
        .await
        .map_err(|e| {
            error!("Failed to add task: {e}");
            port_error(e)
        })?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(&task))))
}

/// POST /tasks/{id}/toggle - Flip a task's completion state
#[utoipa::path(
    post,
    path = "/tasks/{id}/toggle",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 204, description = "Toggled (unknown ids are ignored)"),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_task_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    stores.planner.toggle_task(&id).await.map_err(|e| {
        error!("Failed to toggle task {id}: {e}");
        port_error(e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /tasks/{id} - Remove a task
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 204, description = "Deleted (unknown ids are ignored)"),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    stores.planner.delete_task(&id).await.map_err(|e| {
        error!("Failed to delete task {id}: {e}");
        port_error(e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Plan Handlers
//=========================================================================================

/// GET /plan - The current study plan, if any
#[utoipa::path(
    get,
    path = "/plan",
    responses(
        (status = 200, description = "Current plan, or null when none is live", body = Option<PlanResponse>),
        (status = 401, description = "No active session")
    )
)]
pub async fn get_plan_handler(State(state): State<Arc<AppState>>) -> Json<Option<PlanResponse>> {
    let stores = state.stores.lock().await;
    Json(stores.planner.current_plan().map(PlanResponse::from))
}

/// POST /plan/generate - Generate and store a fresh weekly plan
///
/// One round trip to the external generator; its failure leaves any existing
/// plan untouched.
#[utoipa::path(
    post,
    path = "/plan/generate",
    request_body = GeneratePlanRequest,
    responses(
        (status = 201, description = "Plan generated", body = PlanResponse),
        (status = 400, description = "No tasks to plan around"),
        (status = 401, description = "No active session"),
        (status = 502, description = "Plan generation failed")
    )
)]
pub async fn generate_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
    Json(req): Json<GeneratePlanRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    let Stores { planner, .. } = &mut *stores;

    if planner.tasks().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please add some tasks in the Planner page first!".to_string(),
        ));
    }

    let tasks = planner.tasks().to_vec();
    let mut subjects: Vec<String> = Vec::new();
    for task in &tasks {
        if !subjects.contains(&task.subject) {
            subjects.push(task.subject.clone());
        }
    }

    let request = PlanRequest {
        subjects,
        available_hours_per_day: req
            .available_hours_per_day
            .unwrap_or(account.study_hours_per_day),
        tasks,
        notes: req.notes.unwrap_or_default(),
    };

    let blocks = state
        .plan_generator
        .generate_plan(&request)
        .await
        .map_err(|e| {
            error!("Plan generation failed: {e}");
            port_error(e)
        })?;

    let plan = planner.set_plan(&account.id, blocks).await.map_err(|e| {
        error!("Failed to store generated plan: {e}");
        port_error(e)
    })?;

    Ok((StatusCode::CREATED, Json(PlanResponse::from(&plan))))
}

/// DELETE /plan - Clear the current plan
#[utoipa::path(
    delete,
    path = "/plan",
    responses(
        (status = 204, description = "Plan cleared"),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn clear_plan_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    stores.planner.clear_plan().await.map_err(|e| {
        error!("Failed to clear plan: {e}");
        port_error(e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /reset - Clear tasks and plan together. Irreversible.
#[utoipa::path(
    post,
    path = "/reset",
    responses(
        (status = 204, description = "Tasks and plan cleared"),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn reset_data_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut stores = state.stores.lock().await;
    stores.planner.reset_data().await.map_err(|e| {
        error!("Failed to reset data: {e}");
        port_error(e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

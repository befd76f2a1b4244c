//! End-to-end tests for the role-partitioned router, driven over an
//! in-memory store and a stubbed plan generator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use api_lib::config::Config;
use api_lib::web::{
    self,
    state::{AppState, Stores},
};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use lumina_core::domain::{GeneratedBlock, PlanRequest, Weekday};
use lumina_core::ports::{KeyValueStore, PlanGenerationService, PortError, PortResult};
use lumina_core::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

//=========================================================================================
// Test Harness
//=========================================================================================

/// A generator that returns one fixed Monday block, or fails on demand.
struct StubPlanGenerator {
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl PlanGenerationService for StubPlanGenerator {
    async fn generate_plan(&self, request: &PlanRequest) -> PortResult<Vec<GeneratedBlock>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::PlanGeneration(
                "the model returned an unusable plan".to_string(),
            ));
        }
        let subject = request
            .subjects
            .first()
            .cloned()
            .unwrap_or_else(|| "General".to_string());
        Ok(vec![GeneratedBlock {
            day: Weekday::Monday,
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            subject: subject.clone(),
            topic: format!("{subject} fundamentals"),
            duration_minutes: 60,
        }])
    }
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        data_dir: "./unused-in-tests".into(),
        log_level: tracing::Level::INFO,
        openai_api_key: None,
        plan_model: "stub-model".to_string(),
    }
}

async fn test_app() -> (Router, Arc<AtomicBool>) {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let stores = Stores::open(store).await.unwrap();
    let fail = Arc::new(AtomicBool::new(false));
    let state = Arc::new(AppState {
        stores: tokio::sync::Mutex::new(stores),
        plan_generator: Arc::new(StubPlanGenerator { fail: fail.clone() }),
        config: Arc::new(test_config()),
    });
    (web::router(state), fail)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json_body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router, email: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        Some(json!({"email": email, "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login as {email} failed: {body}");
    body
}

async fn add_task(app: &Router, title: &str, subject: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/tasks",
        Some(json!({
            "title": title,
            "subject": subject,
            "dueDate": "2024-06-21",
            "difficulty": "Hard",
            "priority": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

//=========================================================================================
// Authentication & Gating
//=========================================================================================

#[tokio::test(start_paused = true)]
async fn protected_routes_reject_logged_out_callers() {
    let (app, _) = test_app().await;
    for uri in ["/tasks", "/plan", "/dashboard", "/auth/me"] {
        let (status, _) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test(start_paused = true)]
async fn login_establishes_a_session_visible_via_me() {
    let (app, _) = test_app().await;
    let account = login(&app, "student@example.com").await;
    assert_eq!(account["role"], "user");

    let (status, me) = send(&app, "GET", "/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "student@example.com");
}

#[tokio::test(start_paused = true)]
async fn unknown_email_is_auto_provisioned_as_a_user() {
    let (app, _) = test_app().await;
    let account = login(&app, "new@z.com").await;
    assert_eq!(account["role"], "user");
    assert_eq!(account["status"], "active");
    assert_eq!(account["isFlagged"], false);
    assert_eq!(account["name"], "new");
}

#[tokio::test(start_paused = true)]
async fn register_conflicts_on_a_seeded_email() {
    let (app, _) = test_app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        Some(json!({"email": "Student@example.com", "name": "Imposter", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test(start_paused = true)]
async fn under_privileged_accounts_are_redirected_to_the_dashboard() {
    let (app, _) = test_app().await;

    login(&app, "student@example.com").await;
    for uri in ["/moderator/users", "/admin/users"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert_eq!(location, "/dashboard");
    }

    login(&app, "imacow47@gmail.com").await;
    let (status, roster) = send(&app, "GET", "/moderator/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster["metrics"]["totalUsers"], 3);
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/admin/users").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test(start_paused = true)]
async fn disabling_an_account_blocks_its_next_login() {
    let (app, _) = test_app().await;

    login(&app, "ahmedokovic@gmail.com").await;
    let (status, _) = send(&app, "POST", "/admin/users/user-1/status", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "POST", "/auth/logout", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({"email": "student@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

#[tokio::test(start_paused = true)]
async fn moderators_can_flag_but_not_change_roles() {
    let (app, _) = test_app().await;

    login(&app, "imacow47@gmail.com").await;
    let (status, _) = send(&app, "POST", "/moderator/users/user-1/flag", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, roster) = send(&app, "GET", "/moderator/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster["metrics"]["flaggedUsers"], 1);
}

//=========================================================================================
// Tasks, Plans, Dashboard
//=========================================================================================

#[tokio::test(start_paused = true)]
async fn task_lifecycle_round_trips() {
    let (app, _) = test_app().await;
    login(&app, "student@example.com").await;

    let task = add_task(&app, "Integration worksheet", "Calculus").await;
    let id = task["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", &format!("/tasks/{id}/toggle"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, tasks) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(tasks[0]["completed"], true);

    let (status, _) = send(&app, "DELETE", &format!("/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, tasks) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(tasks.as_array().unwrap().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn plan_generation_requires_tasks() {
    let (app, _) = test_app().await;
    login(&app, "student@example.com").await;
    let (status, _) = send(&app, "POST", "/plan/generate", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn plan_generation_stores_blocks_with_fresh_ids() {
    let (app, _) = test_app().await;
    login(&app, "student@example.com").await;
    add_task(&app, "Integration worksheet", "Calculus").await;

    let (status, plan) = send(&app, "POST", "/plan/generate", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plan["blocks"][0]["subject"], "Calculus");
    assert!(plan["blocks"][0]["id"]
        .as_str()
        .unwrap()
        .starts_with("block-"));

    let (status, fetched) = send(&app, "GET", "/plan", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], plan["id"]);
}

#[tokio::test(start_paused = true)]
async fn generation_failure_leaves_the_previous_plan_in_place() {
    let (app, fail) = test_app().await;
    login(&app, "student@example.com").await;
    add_task(&app, "Integration worksheet", "Calculus").await;

    let (status, first) = send(&app, "POST", "/plan/generate", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);

    fail.store(true, Ordering::SeqCst);
    let (status, _) = send(&app, "POST", "/plan/generate", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, current) = send(&app, "GET", "/plan", None).await;
    assert_eq!(current["id"], first["id"]);
}

#[tokio::test(start_paused = true)]
async fn reset_clears_tasks_and_plan() {
    let (app, _) = test_app().await;
    login(&app, "student@example.com").await;
    add_task(&app, "Integration worksheet", "Calculus").await;
    send(&app, "POST", "/plan/generate", Some(json!({}))).await;

    let (status, _) = send(&app, "POST", "/reset", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tasks) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(tasks.as_array().unwrap().len(), 0);
    let (_, plan) = send(&app, "GET", "/plan", None).await;
    assert!(plan.is_null());
}

#[tokio::test(start_paused = true)]
async fn dashboard_reports_progress_and_premium_status() {
    let (app, _) = test_app().await;
    login(&app, "student@example.com").await;
    add_task(&app, "Integration worksheet", "Calculus").await;

    let (status, dashboard) = send(&app, "GET", "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["stats"]["totalTasks"], 1);
    assert_eq!(dashboard["stats"]["completedTasks"], 0);
    assert_eq!(dashboard["stats"]["premiumStatus"], false);
    assert_eq!(dashboard["nextTask"]["title"], "Integration worksheet");

    let (_, refreshed) = send(&app, "POST", "/profile/premium", None).await;
    assert_eq!(refreshed["role"], "premium");
    let (_, dashboard) = send(&app, "GET", "/dashboard", None).await;
    assert_eq!(dashboard["stats"]["premiumStatus"], true);
}

#[tokio::test(start_paused = true)]
async fn profile_updates_show_up_in_the_admin_roster() {
    let (app, _) = test_app().await;
    login(&app, "student@example.com").await;
    let (status, updated) = send(
        &app,
        "PUT",
        "/profile",
        Some(json!({"name": "Night Owl", "studyHoursPerDay": 2.5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Night Owl");

    login(&app, "ahmedokovic@gmail.com").await;
    let (_, roster) = send(&app, "GET", "/admin/users", None).await;
    let student = roster["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == "user-1")
        .unwrap();
    assert_eq!(student["name"], "Night Owl");
    assert_eq!(student["studyHoursPerDay"], 2.5);
}

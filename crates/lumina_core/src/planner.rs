//! crates/lumina_core/src/planner.rs
//!
//! The task and plan store: the per-session task list and the single live
//! study plan, each persisted as its own record. Tasks keep insertion order;
//! the plan record is removed from the store whenever no plan is live.

use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::domain::{GeneratedBlock, NewTask, StudyBlock, StudyPlan, Task};
use crate::ports::{KeyValueStore, PortError, PortResult, PLAN_KEY, TASKS_KEY};

pub struct PlannerStore {
    store: Arc<dyn KeyValueStore>,
    tasks: Vec<Task>,
    current_plan: Option<StudyPlan>,
}

impl PlannerStore {
    /// Restores tasks and the plan from the persistent store. Absent records
    /// yield empty defaults; a record that no longer parses is treated the
    /// same way.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> PortResult<Self> {
        let tasks = match store.get(TASKS_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(tasks) => tasks,
                Err(err) => {
                    warn!("Discarding corrupt task record: {err}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let current_plan = match store.get(PLAN_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(plan) => Some(plan),
                Err(err) => {
                    warn!("Discarding corrupt plan record: {err}");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            store,
            tasks,
            current_plan,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn current_plan(&self) -> Option<&StudyPlan> {
        self.current_plan.as_ref()
    }

    /// Assigns a fresh id, appends, and flushes the full task collection.
    pub async fn add_task(&mut self, new_task: NewTask) -> PortResult<Task> {
        let task = Task {
            id: format!("task-{}", Uuid::new_v4()),
            title: new_task.title,
            subject: new_task.subject,
            due_date: new_task.due_date,
            difficulty: new_task.difficulty,
            completed: new_task.completed,
            priority: new_task.priority,
        };
        self.tasks.push(task.clone());
        self.flush_tasks().await?;
        Ok(task)
    }

    /// Flips the completion state of the matching task. Unknown ids no-op.
    pub async fn toggle_task(&mut self, id: &str) -> PortResult<()> {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.completed = !task.completed;
        }
        self.flush_tasks().await
    }

    /// Removes the matching task. Unknown ids no-op.
    pub async fn delete_task(&mut self, id: &str) -> PortResult<()> {
        self.tasks.retain(|t| t.id != id);
        self.flush_tasks().await
    }

    /// Wraps the generated blocks into a new plan owned by `user_id`,
    /// replacing any existing plan. The store's only contribution to block
    /// content is the fresh id on each block.
    ///
    /// An empty block list still produces a live (zero-block) plan; only
    /// [`Self::clear_plan`] removes the plan entirely.
    pub async fn set_plan(
        &mut self,
        user_id: &str,
        blocks: Vec<GeneratedBlock>,
    ) -> PortResult<StudyPlan> {
        let blocks = blocks
            .into_iter()
            .map(|b| StudyBlock {
                id: format!("block-{}", Uuid::new_v4()),
                day: b.day,
                start_time: b.start_time,
                end_time: b.end_time,
                subject: b.subject,
                topic: b.topic,
                duration_minutes: b.duration_minutes,
            })
            .collect();

        let plan = StudyPlan {
            id: format!("plan-{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            title: format!("Plan generated on {}", Local::now().format("%-m/%-d/%Y")),
            created_at: Utc::now(),
            blocks,
        };
        self.current_plan = Some(plan.clone());
        self.flush_plan().await?;
        Ok(plan)
    }

    /// Removes the current plan and its persisted record.
    pub async fn clear_plan(&mut self) -> PortResult<()> {
        self.current_plan = None;
        self.flush_plan().await
    }

    /// Clears tasks and plan and both persisted records. Irreversible.
    pub async fn reset_data(&mut self) -> PortResult<()> {
        self.tasks.clear();
        self.current_plan = None;
        self.store.remove(TASKS_KEY).await?;
        self.store.remove(PLAN_KEY).await
    }

    async fn flush_tasks(&self) -> PortResult<()> {
        let raw = serde_json::to_string(&self.tasks)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(TASKS_KEY, &raw).await
    }

    async fn flush_plan(&self) -> PortResult<()> {
        match &self.current_plan {
            Some(plan) => {
                let raw = serde_json::to_string(plan)
                    .map_err(|e| PortError::Unexpected(e.to_string()))?;
                self.store.set(PLAN_KEY, &raw).await
            }
            None => self.store.remove(PLAN_KEY).await,
        }
    }
}

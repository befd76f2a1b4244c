//! crates/lumina_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage backend or transport; the
//! serde derives exist because every record is persisted as a camelCase
//! JSON blob.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The role attached to an account. Determines which operations the
/// directory will accept from this account as the acting party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Moderator,
    Admin,
    Premium,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
            UserRole::Premium => "premium",
        }
    }

    /// Admin capability: exactly the admin role.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Moderator capability: moderators and admins both qualify.
    pub fn is_moderator(&self) -> bool {
        matches!(self, UserRole::Moderator | UserRole::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Disabled,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Disabled => "disabled",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            AccountStatus::Active => AccountStatus::Disabled,
            AccountStatus::Disabled => AccountStatus::Active,
        }
    }
}

/// A user account as held in the directory roster.
///
/// `email` is the identity key for lookups (compared case-insensitively
/// after trimming); `id` is the stable storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub status: AccountStatus,
    pub is_flagged: bool,
    pub study_hours_per_day: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// A single study task owned by the planner store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub due_date: NaiveDate,
    pub difficulty: Difficulty,
    pub completed: bool,
    /// 1 (lowest) to 5 (highest).
    pub priority: u8,
}

/// The id-less payload used to create a [`Task`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub subject: String,
    pub due_date: NaiveDate,
    pub difficulty: Difficulty,
    pub completed: bool,
    pub priority: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// A scheduled slot inside a study plan. Block content comes from the plan
/// generator as-is; the store only attaches the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyBlock {
    pub id: String,
    pub day: Weekday,
    /// Wall-clock time in HH:MM form, as produced by the generator.
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub topic: String,
    pub duration_minutes: u32,
}

/// A block candidate as returned by the plan generator, before the store
/// assigns it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBlock {
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub topic: String,
    pub duration_minutes: u32,
}

/// The single live weekly plan. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub blocks: Vec<StudyBlock>,
}

/// Input for one plan-generation round trip.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Deduplicated subject names, in first-seen order.
    pub subjects: Vec<String>,
    pub available_hours_per_day: f64,
    pub tasks: Vec<Task>,
    pub notes: String,
}

/// Snapshot numbers for the dashboard. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub active_plan: bool,
    pub premium_status: bool,
}

impl Stats {
    pub fn from_state(tasks: &[Task], plan: Option<&StudyPlan>, account: &Account) -> Self {
        Self {
            total_tasks: tasks.len(),
            completed_tasks: tasks.iter().filter(|t| t.completed).count(),
            active_plan: plan.is_some(),
            premium_status: account.role == UserRole::Premium,
        }
    }
}

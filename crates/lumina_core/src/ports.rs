//! crates/lumina_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the disk
//! store or the plan-generation API.

use async_trait::async_trait;

use crate::domain::{GeneratedBlock, PlanRequest};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by all port operations and store mutations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Your account has been disabled. Please contact admin.")]
    AccountDisabled,
    #[error("An account with this email already exists.")]
    EmailTaken,
    #[error("Failed to generate study plan: {0}")]
    PlanGeneration(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Keys
//=========================================================================================

// The four logical persisted records. Key names are stable; renaming one
// orphans the data already on disk.

/// The full account roster.
pub const ROSTER_KEY: &str = "lumina_all_users";
/// The current session's account snapshot.
pub const SESSION_KEY: &str = "lumina_user";
/// The task collection.
pub const TASKS_KEY: &str = "lumina_tasks";
/// The current study plan. Absent key means no plan.
pub const PLAN_KEY: &str = "lumina_plan";

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable string-keyed blob storage. Each of the four logical records above
/// is flushed independently through this interface, and a `set` must be
/// atomic from the perspective of a concurrent same-process reader.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removes the record. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// The external weekly-schedule generator.
///
/// One round trip per call, no retries. Implementations normalize every
/// transport, authentication, or malformed-response failure into
/// [`PortError::PlanGeneration`] so callers surface a single error and never
/// apply a partial plan.
#[async_trait]
pub trait PlanGenerationService: Send + Sync {
    async fn generate_plan(&self, request: &PlanRequest) -> PortResult<Vec<GeneratedBlock>>;
}

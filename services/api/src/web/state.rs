//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use lumina_core::ports::{KeyValueStore, PlanGenerationService, PortResult};
use lumina_core::{AccountDirectory, PlannerStore, SessionStore};
use tokio::sync::Mutex;

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all
/// handlers.
pub struct AppState {
    /// All three stores behind one lock: handlers serialize on it, which is
    /// the whole concurrency model. A second in-flight login or generation
    /// request queues behind the first.
    pub stores: Mutex<Stores>,
    pub plan_generator: Arc<dyn PlanGenerationService>,
    pub config: Arc<Config>,
}

/// The directory, session, and planner stores, loaded once at startup.
pub struct Stores {
    pub directory: AccountDirectory,
    pub session: SessionStore,
    pub planner: PlannerStore,
}

impl Stores {
    /// Loads the directory and planner from the persistent store, then
    /// restores the session against the freshly loaded roster.
    pub async fn open(store: Arc<dyn KeyValueStore>) -> PortResult<Self> {
        let directory = AccountDirectory::load(store.clone()).await?;
        let planner = PlannerStore::load(store.clone()).await?;
        let mut session = SessionStore::new(store);
        session.restore(&directory).await?;

        Ok(Self {
            directory,
            session,
            planner,
        })
    }
}

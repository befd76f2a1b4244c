pub mod directory;
pub mod domain;
pub mod memory;
pub mod planner;
pub mod ports;
pub mod session;

pub use directory::{role_for_email, AccountDirectory};
pub use domain::{
    Account, AccountStatus, Difficulty, GeneratedBlock, NewTask, PlanRequest, Stats, StudyBlock,
    StudyPlan, Task, UserRole, Weekday,
};
pub use memory::MemoryStore;
pub use planner::PlannerStore;
pub use ports::{KeyValueStore, PlanGenerationService, PortError, PortResult};
pub use session::SessionStore;

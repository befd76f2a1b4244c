//! crates/lumina_core/src/directory.rs
//!
//! The account directory: the in-memory roster of all known accounts and the
//! single source of truth for role, status, and flag state. Loaded from the
//! persistent store once at construction; every mutation re-serializes the
//! full roster back (no partial writes).

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

use crate::domain::{Account, AccountStatus, UserRole};
use crate::ports::{KeyValueStore, PortError, PortResult, ROSTER_KEY};

/// The two addresses with pre-assigned elevated roles.
const ADMIN_EMAIL: &str = "ahmedokovic@gmail.com";
const MODERATOR_EMAIL: &str = "imacow47@gmail.com";

/// Role assignment on account creation is derived deterministically from the
/// email: the two fixed addresses above map to admin/moderator, everything
/// else is a plain user.
pub fn role_for_email(email: &str) -> UserRole {
    match normalize_email(email).as_str() {
        ADMIN_EMAIL => UserRole::Admin,
        MODERATOR_EMAIL => UserRole::Moderator,
        _ => UserRole::User,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn seed_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// The bootstrap roster used when the store holds no account data yet.
fn seed_roster() -> Vec<Account> {
    vec![
        Account {
            id: "admin-1".to_string(),
            name: "Ahmed Admin".to_string(),
            email: ADMIN_EMAIL.to_string(),
            role: UserRole::Admin,
            created_at: seed_date(2023, 1, 1),
            status: AccountStatus::Active,
            is_flagged: false,
            study_hours_per_day: 6.0,
        },
        Account {
            id: "mod-1".to_string(),
            name: "Ima Moderator".to_string(),
            email: MODERATOR_EMAIL.to_string(),
            role: UserRole::Moderator,
            created_at: seed_date(2023, 2, 15),
            status: AccountStatus::Active,
            is_flagged: false,
            study_hours_per_day: 4.0,
        },
        Account {
            id: "user-1".to_string(),
            name: "Standard Student".to_string(),
            email: "student@example.com".to_string(),
            role: UserRole::User,
            created_at: seed_date(2023, 10, 1),
            status: AccountStatus::Active,
            is_flagged: false,
            study_hours_per_day: 3.0,
        },
    ]
}

pub struct AccountDirectory {
    store: Arc<dyn KeyValueStore>,
    accounts: Vec<Account>,
}

impl AccountDirectory {
    /// Restores the roster from the persistent store, seeding the bootstrap
    /// accounts when no (usable) data exists. Runs exactly once per process,
    /// before any other directory operation; the result is flushed straight
    /// back so the store and memory agree from the start.
    ///
    /// A roster record that no longer parses is treated as absent.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> PortResult<Self> {
        let accounts = match store.get(ROSTER_KEY).await? {
            Some(raw) => match serde_json::from_str::<Vec<Account>>(&raw) {
                Ok(accounts) => accounts,
                Err(err) => {
                    warn!("Discarding corrupt account roster record: {err}");
                    seed_roster()
                }
            },
            None => seed_roster(),
        };

        let directory = Self { store, accounts };
        directory.flush().await?;
        Ok(directory)
    }

    /// Serializes the entire roster to the store in one write.
    async fn flush(&self) -> PortResult<()> {
        let raw = serde_json::to_string(&self.accounts)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(ROSTER_KEY, &raw).await
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Case-insensitive exact match after trimming whitespace.
    pub fn find_by_email(&self, email: &str) -> Option<&Account> {
        let needle = normalize_email(email);
        self.accounts
            .iter()
            .find(|a| normalize_email(&a.email) == needle)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Inserts the account if its id is unseen, replaces the existing record
    /// otherwise, then flushes the full roster.
    pub async fn upsert(&mut self, account: Account) -> PortResult<()> {
        match self.accounts.iter_mut().find(|a| a.id == account.id) {
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
        self.flush().await
    }

    /// Admin-only: assigns `new_role` to the target account. An unknown
    /// target id is a silent no-op.
    pub async fn set_role(
        &mut self,
        actor_role: UserRole,
        target_id: &str,
        new_role: UserRole,
    ) -> PortResult<()> {
        if !actor_role.is_admin() {
            return Err(PortError::Unauthorized);
        }
        if let Some(account) = self.accounts.iter_mut().find(|a| a.id == target_id) {
            account.role = new_role;
        }
        self.flush().await
    }

    /// Admin-only: flips the target between active and disabled.
    pub async fn toggle_status(&mut self, actor_role: UserRole, target_id: &str) -> PortResult<()> {
        if !actor_role.is_admin() {
            return Err(PortError::Unauthorized);
        }
        if let Some(account) = self.accounts.iter_mut().find(|a| a.id == target_id) {
            account.status = account.status.toggled();
        }
        self.flush().await
    }

    /// Moderator-or-admin: flips the target's flag.
    pub async fn toggle_flag(&mut self, actor_role: UserRole, target_id: &str) -> PortResult<()> {
        if !actor_role.is_moderator() {
            return Err(PortError::Unauthorized);
        }
        if let Some(account) = self.accounts.iter_mut().find(|a| a.id == target_id) {
            account.is_flagged = !account.is_flagged;
        }
        self.flush().await
    }
}

//! crates/lumina_core/src/session.rs
//!
//! The session store: at most one currently-authenticated account, persisted
//! as a snapshot and kept consistent with the account directory. Profile and
//! premium changes write both copies (the snapshot and the roster record).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::directory::{role_for_email, AccountDirectory};
use crate::domain::{Account, AccountStatus, UserRole};
use crate::ports::{KeyValueStore, PortError, PortResult, SESSION_KEY};

/// Fixed simulated network latency for login and registration.
pub const LOGIN_LATENCY: Duration = Duration::from_millis(800);

const DEFAULT_STUDY_HOURS: f64 = 4.0;

pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    current: Option<Account>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Account> {
        self.current.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.current.as_ref().is_some_and(|a| a.role.is_admin())
    }

    pub fn is_moderator(&self) -> bool {
        self.current.as_ref().is_some_and(|a| a.role.is_moderator())
    }

    /// Restores the persisted session, resolving the snapshot against the
    /// directory by email rather than trusting the stored copy, so roster
    /// changes made since the snapshot was written are picked up.
    ///
    /// A snapshot that resolves to a disabled account clears the persisted
    /// record and leaves the session logged out. A snapshot whose email is no
    /// longer in the roster resolves to logged out without clearing.
    pub async fn restore(&mut self, directory: &AccountDirectory) -> PortResult<Option<Account>> {
        let Some(raw) = self.store.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        let snapshot: Account = match serde_json::from_str(&raw) {
            Ok(account) => account,
            Err(err) => {
                warn!("Discarding corrupt session snapshot: {err}");
                self.store.remove(SESSION_KEY).await?;
                return Ok(None);
            }
        };

        match directory.find_by_email(&snapshot.email) {
            Some(account) if account.status == AccountStatus::Disabled => {
                self.store.remove(SESSION_KEY).await?;
                self.current = None;
                Ok(None)
            }
            Some(account) => {
                self.current = Some(account.clone());
                Ok(self.current.clone())
            }
            None => {
                self.current = None;
                Ok(None)
            }
        }
    }

    /// Authenticates by email. The password is accepted but never validated
    /// here; there is no credential layer in this trust model.
    ///
    /// A known disabled account fails closed with [`PortError::AccountDisabled`]
    /// and leaves the session untouched. An unknown email is auto-provisioned
    /// as a fresh account (role derived from the email rule) before the
    /// session is established.
    pub async fn login(
        &mut self,
        directory: &mut AccountDirectory,
        email: &str,
        _password: &str,
    ) -> PortResult<Account> {
        tokio::time::sleep(LOGIN_LATENCY).await;

        if let Some(existing) = directory.find_by_email(email) {
            if existing.status == AccountStatus::Disabled {
                return Err(PortError::AccountDisabled);
            }
            let account = existing.clone();
            return self.activate(account).await;
        }

        let account = provision(email, email_local_part(email));
        directory.upsert(account.clone()).await?;
        self.activate(account).await
    }

    /// Creates a fresh account and logs it in. Unlike the auto-provision path
    /// in [`Self::login`], registration receives an explicit display name.
    ///
    /// An email already present in the directory is rejected with
    /// [`PortError::EmailTaken`], keeping one account per email.
    pub async fn register(
        &mut self,
        directory: &mut AccountDirectory,
        email: &str,
        name: &str,
        _password: &str,
    ) -> PortResult<Account> {
        tokio::time::sleep(LOGIN_LATENCY).await;

        if directory.find_by_email(email).is_some() {
            return Err(PortError::EmailTaken);
        }

        let account = provision(email, name.to_string());
        directory.upsert(account.clone()).await?;
        self.activate(account).await
    }

    /// Clears the session and its persisted snapshot. Idempotent.
    pub async fn logout(&mut self) -> PortResult<()> {
        self.current = None;
        self.store.remove(SESSION_KEY).await
    }

    /// Updates the display name and study-hour budget on both the session's
    /// account and the matching directory record. No-op when logged out.
    pub async fn update_profile(
        &mut self,
        directory: &mut AccountDirectory,
        name: &str,
        study_hours: f64,
    ) -> PortResult<()> {
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        current.name = name.to_string();
        current.study_hours_per_day = study_hours;
        let updated = current.clone();
        directory.upsert(updated.clone()).await?;
        self.persist_snapshot(&updated).await
    }

    /// Switches the session's role to premium. No-op when logged out.
    pub async fn upgrade_to_premium(&mut self, directory: &mut AccountDirectory) -> PortResult<()> {
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        current.role = UserRole::Premium;
        let updated = current.clone();
        directory.upsert(updated.clone()).await?;
        self.persist_snapshot(&updated).await
    }

    /// Drops a premium role back to user. Only acts when the current role is
    /// exactly premium; anything else (including logged out) is a no-op.
    pub async fn cancel_premium(&mut self, directory: &mut AccountDirectory) -> PortResult<()> {
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        if current.role != UserRole::Premium {
            return Ok(());
        }
        current.role = UserRole::User;
        let updated = current.clone();
        directory.upsert(updated.clone()).await?;
        self.persist_snapshot(&updated).await
    }

    async fn activate(&mut self, account: Account) -> PortResult<Account> {
        self.persist_snapshot(&account).await?;
        self.current = Some(account.clone());
        Ok(account)
    }

    async fn persist_snapshot(&self, account: &Account) -> PortResult<()> {
        let raw = serde_json::to_string(account)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(SESSION_KEY, &raw).await
    }
}

fn provision(email: &str, name: String) -> Account {
    Account {
        id: format!("user-{}", Uuid::new_v4()),
        email: email.trim().to_string(),
        name,
        role: role_for_email(email),
        created_at: Utc::now(),
        status: AccountStatus::Active,
        is_flagged: false,
        study_hours_per_day: DEFAULT_STUDY_HOURS,
    }
}

fn email_local_part(email: &str) -> String {
    email
        .trim()
        .split('@')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    async fn setup(store: &MemoryStore) -> (AccountDirectory, SessionStore) {
        let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());
        let directory = AccountDirectory::load(shared.clone()).await.unwrap();
        let session = SessionStore::new(shared);
        (directory, session)
    }

    async fn persisted_snapshot(store: &MemoryStore) -> Option<Account> {
        store
            .get(SESSION_KEY)
            .await
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn login_with_unknown_email_auto_provisions_a_user_account() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;

        let account = session
            .login(&mut directory, "new@z.com", "pw")
            .await
            .unwrap();

        assert_eq!(account.role, UserRole::User);
        assert_eq!(account.status, AccountStatus::Active);
        assert!(!account.is_flagged);
        assert_eq!(account.name, "new");
        assert_eq!(account.study_hours_per_day, DEFAULT_STUDY_HOURS);
        assert_eq!(session.current().unwrap().id, account.id);
        assert_eq!(directory.find_by_email("new@z.com").unwrap().id, account.id);
        assert_eq!(persisted_snapshot(&store).await.unwrap().id, account.id);
    }

    #[tokio::test(start_paused = true)]
    async fn login_with_known_email_reuses_the_roster_record() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;

        let account = session
            .login(&mut directory, "student@example.com", "pw")
            .await
            .unwrap();

        assert_eq!(account.id, "user-1");
        assert_eq!(directory.accounts().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn login_fails_closed_for_disabled_accounts() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;

        directory.toggle_status(UserRole::Admin, "user-1").await.unwrap();
        let err = session
            .login(&mut directory, "student@example.com", "pw")
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::AccountDisabled));
        assert!(session.current().is_none());
        assert!(persisted_snapshot(&store).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_the_admin_account_blocks_its_next_login() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;

        directory.toggle_status(UserRole::Admin, "admin-1").await.unwrap();
        let err = session
            .login(&mut directory, "ahmedokovic@gmail.com", "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::AccountDisabled));
    }

    #[tokio::test(start_paused = true)]
    async fn register_creates_the_account_and_logs_in() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;

        let account = session
            .register(&mut directory, "fresh@z.com", "Fresh Face", "pw")
            .await
            .unwrap();

        assert_eq!(account.name, "Fresh Face");
        assert_eq!(account.role, UserRole::User);
        assert_eq!(session.current().unwrap().id, account.id);
        assert!(directory.find_by_email("fresh@z.com").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn register_rejects_an_email_already_in_the_roster() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;

        let err = session
            .register(&mut directory, "Student@example.com", "Imposter", "pw")
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::EmailTaken));
        assert!(session.current().is_none());
        assert_eq!(directory.accounts().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_resolves_against_the_roster_not_the_snapshot() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;
        session
            .login(&mut directory, "student@example.com", "pw")
            .await
            .unwrap();

        // Roster-side rename after the snapshot was written.
        let mut renamed = directory.find_by_id("user-1").unwrap().clone();
        renamed.name = "Roster Rename".to_string();
        directory.upsert(renamed).await.unwrap();

        let mut restored_session = SessionStore::new(Arc::new(store.clone()));
        let restored = restored_session.restore(&directory).await.unwrap().unwrap();
        assert_eq!(restored.name, "Roster Rename");
    }

    #[tokio::test(start_paused = true)]
    async fn restore_clears_a_session_whose_account_was_disabled() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;
        session
            .login(&mut directory, "student@example.com", "pw")
            .await
            .unwrap();

        directory.toggle_status(UserRole::Admin, "user-1").await.unwrap();

        // Simulated process restart: a fresh session store re-runs restore.
        let mut restored_session = SessionStore::new(Arc::new(store.clone()));
        let restored = restored_session.restore(&directory).await.unwrap();

        assert!(restored.is_none());
        assert!(restored_session.current().is_none());
        assert!(persisted_snapshot(&store).await.is_none());
    }

    #[tokio::test]
    async fn restore_without_a_snapshot_is_logged_out() {
        let store = MemoryStore::new();
        let (directory, mut session) = setup(&store).await;
        assert!(session.restore(&directory).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn restore_discards_a_corrupt_snapshot() {
        let store = MemoryStore::new();
        let (directory, mut session) = setup(&store).await;
        store.set(SESSION_KEY, "not json at all").await.unwrap();

        assert!(session.restore(&directory).await.unwrap().is_none());
        assert!(persisted_snapshot(&store).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_is_idempotent() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;
        session
            .login(&mut directory, "student@example.com", "pw")
            .await
            .unwrap();

        session.logout().await.unwrap();
        session.logout().await.unwrap();

        assert!(session.current().is_none());
        assert!(persisted_snapshot(&store).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn update_profile_writes_both_copies() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;
        session
            .login(&mut directory, "student@example.com", "pw")
            .await
            .unwrap();

        session
            .update_profile(&mut directory, "Night Owl", 2.5)
            .await
            .unwrap();

        let roster_copy = directory.find_by_id("user-1").unwrap();
        let snapshot_copy = persisted_snapshot(&store).await.unwrap();
        assert_eq!(roster_copy.name, "Night Owl");
        assert_eq!(roster_copy.study_hours_per_day, 2.5);
        assert_eq!(&snapshot_copy, roster_copy);
        assert_eq!(session.current().unwrap().name, "Night Owl");
    }

    #[tokio::test]
    async fn update_profile_is_a_noop_when_logged_out() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;

        session
            .update_profile(&mut directory, "Nobody", 9.0)
            .await
            .unwrap();

        assert!(session.current().is_none());
        assert!(persisted_snapshot(&store).await.is_none());
        assert!(directory.accounts().iter().all(|a| a.name != "Nobody"));
    }

    #[tokio::test(start_paused = true)]
    async fn premium_upgrade_and_cancel_round_trip() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;
        session
            .login(&mut directory, "student@example.com", "pw")
            .await
            .unwrap();

        session.upgrade_to_premium(&mut directory).await.unwrap();
        assert_eq!(session.current().unwrap().role, UserRole::Premium);
        assert_eq!(
            directory.find_by_id("user-1").unwrap().role,
            UserRole::Premium
        );

        session.cancel_premium(&mut directory).await.unwrap();
        assert_eq!(session.current().unwrap().role, UserRole::User);
        assert_eq!(directory.find_by_id("user-1").unwrap().role, UserRole::User);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_premium_on_a_non_premium_session_is_a_noop() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;
        session
            .login(&mut directory, "ahmedokovic@gmail.com", "pw")
            .await
            .unwrap();

        session.cancel_premium(&mut directory).await.unwrap();

        assert_eq!(session.current().unwrap().role, UserRole::Admin);
        assert_eq!(
            directory.find_by_id("admin-1").unwrap().role,
            UserRole::Admin
        );
    }

    #[tokio::test(start_paused = true)]
    async fn capability_flags_follow_the_current_role() {
        let store = MemoryStore::new();
        let (mut directory, mut session) = setup(&store).await;

        assert!(!session.is_admin());
        assert!(!session.is_moderator());

        session
            .login(&mut directory, "imacow47@gmail.com", "pw")
            .await
            .unwrap();
        assert!(!session.is_admin());
        assert!(session.is_moderator());

        session
            .login(&mut directory, "ahmedokovic@gmail.com", "pw")
            .await
            .unwrap();
        assert!(session.is_admin());
        assert!(session.is_moderator());
    }
}

//! Authentication accessor: current session, staff profile and role flags.
//!
//! A [`SessionContext`] is built explicitly and handed to whoever needs it.
//! `init` restores a previous session once; `teardown` forgets everything.

use crate::error::AppError;
use crate::models::{Profile, Profiles, Role};
use crate::remote::RemoteDataService;
use crate::resource::ResourceStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub issued_at: DateTime<Utc>,
}

/// Credential check and session persistence, owned by the data service's auth layer.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;
    async fn sign_out(&self, session: &Session) -> Result<(), AppError>;
    /// Session persisted from an earlier sign-in, if still valid.
    async fn current_session(&self) -> Result<Option<Session>, AppError>;
}

struct Account {
    user_id: Uuid,
    password: String,
}

/// Fixed accounts held in memory, for development and tests.
#[derive(Default)]
pub struct StaticAuthBackend {
    accounts: HashMap<String, Account>,
    current: Mutex<Option<Session>>,
}

impl StaticAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, email: &str, password: &str, user_id: Uuid) -> Self {
        self.accounts.insert(
            email.to_lowercase(),
            Account {
                user_id,
                password: password.to_string(),
            },
        );
        self
    }

    fn current(&self) -> MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AuthBackend for StaticAuthBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = email.trim().to_lowercase();
        let account = self
            .accounts
            .get(&email)
            .filter(|a| a.password == password)
            .ok_or_else(|| AppError::Unauthorized("invalid login credentials".into()))?;
        let session = Session {
            user_id: account.user_id,
            email,
            access_token: Uuid::new_v4().to_string(),
            issued_at: Utc::now(),
        };
        *self.current() = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AppError> {
        let mut current = self.current();
        if current.as_ref().is_some_and(|s| s.access_token == session.access_token) {
            *current = None;
        }
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AppError> {
        Ok(self.current().clone())
    }
}

#[derive(Default)]
struct SessionState {
    initialized: bool,
    session: Option<Session>,
    profile: Option<Profile>,
}

pub struct SessionContext {
    backend: Arc<dyn AuthBackend>,
    profiles: ResourceStore<Profiles>,
    state: RwLock<SessionState>,
}

impl SessionContext {
    pub fn new(backend: Arc<dyn AuthBackend>, service: Arc<dyn RemoteDataService>, schema: &str) -> Self {
        SessionContext {
            backend,
            profiles: ResourceStore::new(service, schema),
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Restore a persisted session and its profile. Runs once until `teardown`.
    pub async fn init(&self) -> Result<(), AppError> {
        if self.read().initialized {
            return Ok(());
        }
        let session = self.backend.current_session().await?;
        let profile = match &session {
            Some(s) => self.load_profile(s.user_id).await?,
            None => None,
        };
        tracing::debug!(authenticated = session.is_some(), "session initialised");
        let mut state = self.write();
        state.initialized = true;
        state.session = session;
        state.profile = profile;
        Ok(())
    }

    /// Forget the session and profile; the next `init` restores again.
    pub fn teardown(&self) {
        *self.write() = SessionState::default();
    }

    /// Authenticate and load the staff profile. Inactive staff are signed straight back out.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Profile>, AppError> {
        let session = self.backend.sign_in(email, password).await?;
        let profile = self.load_profile(session.user_id).await?;
        if profile.as_ref().is_some_and(|p| !p.is_active) {
            self.backend.sign_out(&session).await?;
            tracing::warn!(user_id = %session.user_id, "sign-in refused for inactive profile");
            return Err(AppError::Unauthorized("profile is inactive".into()));
        }
        tracing::info!(user_id = %session.user_id, "signed in");
        let mut state = self.write();
        state.initialized = true;
        state.session = Some(session);
        state.profile = profile.clone();
        Ok(profile)
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        let session = self.read().session.clone();
        if let Some(s) = session {
            self.backend.sign_out(&s).await?;
            tracing::info!(user_id = %s.user_id, "signed out");
        }
        let mut state = self.write();
        state.session = None;
        state.profile = None;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.read().initialized
    }

    pub fn session(&self) -> Option<Session> {
        self.read().session.clone()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.read().profile.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().session.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_mechanic(&self) -> bool {
        self.has_role(Role::Mecanico)
    }

    pub fn is_attendant(&self) -> bool {
        self.has_role(Role::Atendente)
    }

    fn has_role(&self, role: Role) -> bool {
        self.read().profile.as_ref().is_some_and(|p| p.role == role)
    }

    async fn load_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        self.profiles.fetch(user_id).await
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

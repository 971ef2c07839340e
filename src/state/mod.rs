//! Shared application state.

pub mod rooms;
pub mod session;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::info;

use crate::{
    config::{AppConfig, Authorizer},
    dao::storage::QuizStore,
    error::ServiceError,
};

pub use rooms::{Audience, RoomRegistry};
pub use session::{SessionRegistry, SessionState};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Everything the handlers need, behind one `Arc`.
pub struct AppState {
    store: RwLock<Option<Arc<dyn QuizStore>>>,
    degraded: watch::Sender<bool>,
    sessions: SessionRegistry,
    rooms: RoomRegistry,
    config: AppConfig,
    authorizer: Arc<dyn Authorizer>,
}

impl AppState {
    /// Build the state with no store attached yet. The service starts
    /// degraded until a store is installed.
    pub fn new(config: AppConfig, authorizer: Arc<dyn Authorizer>) -> SharedState {
        let (degraded, _) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded,
            sessions: SessionRegistry::new(),
            rooms: RoomRegistry::new(),
            config,
            authorizer,
        })
    }

    /// Current store handle, if one is installed.
    pub async fn quiz_store(&self) -> Option<Arc<dyn QuizStore>> {
        self.store.read().await.clone()
    }

    /// Current store handle, or `Degraded` when storage is down.
    pub async fn require_quiz_store(&self) -> Result<Arc<dyn QuizStore>, ServiceError> {
        self.quiz_store().await.ok_or(ServiceError::Degraded)
    }

    /// Attach a store and leave degraded mode.
    pub async fn install_quiz_store(&self, store: Arc<dyn QuizStore>) {
        *self.store.write().await = Some(store);
        self.update_degraded(false);
        info!("durable store attached");
    }

    /// Whether the service is currently running without storage.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Flip the degraded flag, notifying watchers only on change.
    pub fn update_degraded(&self, degraded: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == degraded {
                false
            } else {
                *current = degraded;
                true
            }
        });
    }

    /// Live-session registry.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Connection and room registry.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check a controller credential against the configured authorizer.
    pub fn authorizes(&self, credential: &str) -> bool {
        self.authorizer.allows(credential)
    }
}

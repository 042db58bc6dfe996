//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry of open inspection
//! sessions.

use crate::config::Config;
use qc_inspection_core::{InspectionController, InspectionRepository, SessionConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub repository: Arc<dyn InspectionRepository>,
    pub config: Arc<Config>,
    /// One controller per open inspection.
    sessions: Mutex<HashMap<Uuid, InspectionController>>,
}

impl AppState {
    pub fn new(repository: Arc<dyn InspectionRepository>, config: Arc<Config>) -> Self {
        Self {
            repository,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Autosave settings handed to every new session.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            autosave: self.config.autosave,
            autosave_delay: self.config.autosave_delay,
        }
    }

    /// Returns the controller for `inspection_id`, creating an unloaded one if
    /// none is open.
    pub async fn open_session(&self, inspection_id: Uuid) -> InspectionController {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(inspection_id)
            .or_insert_with(|| {
                info!("Opening session for inspection {}", inspection_id);
                InspectionController::new(self.repository.clone(), self.session_config())
            })
            .clone()
    }

    pub async fn session(&self, inspection_id: Uuid) -> Option<InspectionController> {
        self.sessions.lock().await.get(&inspection_id).cloned()
    }

    /// Forgets a session whose inspection does not exist, without touching
    /// any other controller that may have replaced it.
    pub async fn discard_session(&self, inspection_id: Uuid, controller: &InspectionController) {
        let mut sessions = self.sessions.lock().await;
        if sessions
            .get(&inspection_id)
            .is_some_and(|open| open.same_session(controller))
        {
            sessions.remove(&inspection_id);
            info!("Discarded session for unknown inspection {}", inspection_id);
        }
    }

    /// Closes and forgets the session. Returns `false` if none was open.
    pub async fn close_session(&self, inspection_id: Uuid) -> bool {
        let removed = self.sessions.lock().await.remove(&inspection_id);
        match removed {
            Some(controller) => {
                controller.close().await;
                info!("Closed session for inspection {}", inspection_id);
                true
            }
            None => false,
        }
    }

    pub async fn open_session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

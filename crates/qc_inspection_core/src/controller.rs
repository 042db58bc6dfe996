//! crates/qc_inspection_core/src/controller.rs
//!
//! The inspection session controller: owns the current session, forwards edits
//! to it, and coordinates loading, autosave, manual save and submit against the
//! `InspectionRepository` port.
//!
//! The state lock is never held across a repository call. Each completion
//! carries the generation it was started under and is dropped if the session
//! was replaced or closed in the meantime.

use chrono::Utc;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::autosave::Debouncer;
use crate::completeness::CompletenessReport;
use crate::domain::{
    CheckpointVerdict, InspectionStats, ReadingValue, SubmissionAck, VisualVerdict,
};
use crate::error::{SessionError, SessionResult};
use crate::ports::InspectionRepository;
use crate::session::{InspectionSession, SessionPhase};

/// Default quiet period before an edit is autosaved.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub autosave: bool,
    pub autosave_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave: true,
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
        }
    }
}

struct ControllerState {
    generation: u64,
    inspection_id: Option<Uuid>,
    loading: bool,
    load_error: Option<String>,
    session: Option<InspectionSession>,
    autosave: Debouncer,
}

struct Inner {
    repository: Arc<dyn InspectionRepository>,
    config: SessionConfig,
    state: Mutex<ControllerState>,
}

/// A cheap, cloneable handle to one inspection session.
#[derive(Clone)]
pub struct InspectionController {
    inner: Arc<Inner>,
}

impl InspectionController {
    pub fn new(repository: Arc<dyn InspectionRepository>, config: SessionConfig) -> Self {
        let state = ControllerState {
            generation: 0,
            inspection_id: None,
            loading: false,
            load_error: None,
            session: None,
            autosave: Debouncer::new(config.autosave_delay),
        };
        Self {
            inner: Arc::new(Inner {
                repository,
                config,
                state: Mutex::new(state),
            }),
        }
    }

    //=====================================================================================
    // Lifecycle
    //=====================================================================================

    /// Loads `inspection_id`, replacing whatever session was open.
    ///
    /// On failure the controller holds no session and `load_error` describes why;
    /// the caller decides whether to retry.
    pub async fn load(&self, inspection_id: Uuid) -> SessionResult<()> {
        let generation = {
            let mut state = self.inner.state.lock().await;
            state.generation += 1;
            state.inspection_id = Some(inspection_id);
            state.loading = true;
            state.load_error = None;
            state.session = None;
            state.autosave.cancel();
            state.generation
        };
        info!("Loading inspection {}", inspection_id);

        let loaded = self
            .inner
            .repository
            .get_inspection_by_id(inspection_id)
            .await;

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            debug!("Discarding stale load of inspection {}", inspection_id);
            return Err(SessionError::Superseded);
        }
        state.loading = false;

        let session = loaded
            .map_err(SessionError::from)
            .and_then(|loaded| InspectionSession::from_loaded(inspection_id, loaded));
        match session {
            Ok(session) => {
                info!(
                    "Inspection {} ready with {} checkpoints",
                    inspection_id,
                    session.form().checkpoints.len()
                );
                state.session = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load inspection {}: {}", inspection_id, e);
                state.load_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Drops the session. In-flight completions for it are discarded.
    pub async fn close(&self) {
        let mut state = self.inner.state.lock().await;
        state.generation += 1;
        state.autosave.cancel();
        state.session = None;
        state.loading = false;
        state.load_error = None;
        if let Some(id) = state.inspection_id.take() {
            debug!("Closed inspection session {}", id);
        }
    }

    //=====================================================================================
    // Edits
    //=====================================================================================

    /// Records a reading. `None` means nothing changed: no session, submitted
    /// or submitting, or an unknown checkpoint/sample.
    pub async fn update_reading(
        &self,
        checkpoint_id: &str,
        sample_number: u32,
        value: Option<ReadingValue>,
    ) -> Option<CheckpointVerdict> {
        let mut state = self.inner.state.lock().await;
        let verdict = state
            .session
            .as_mut()?
            .update_reading(checkpoint_id, sample_number, value);
        match verdict {
            Some(_) => self.schedule_autosave(&mut state),
            None => debug!(
                "Ignored reading for checkpoint {} sample {}",
                checkpoint_id, sample_number
            ),
        }
        verdict
    }

    pub async fn update_visual_check(
        &self,
        checkpoint_id: &str,
        sample_number: u32,
        verdict: VisualVerdict,
    ) -> Option<CheckpointVerdict> {
        self.update_reading(checkpoint_id, sample_number, Some(verdict.into()))
            .await
    }

    pub async fn update_remarks(&self, remarks: impl Into<String>) -> bool {
        let mut state = self.inner.state.lock().await;
        let updated = state
            .session
            .as_mut()
            .is_some_and(|s| s.update_remarks(remarks));
        if updated {
            self.schedule_autosave(&mut state);
        }
        updated
    }

    pub async fn reset_readings(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        let reset = state.session.as_mut().is_some_and(|s| s.reset_readings());
        if reset {
            info!("Readings reset for inspection {:?}", state.inspection_id);
            self.schedule_autosave(&mut state);
        }
        reset
    }

    fn schedule_autosave(&self, state: &mut ControllerState) {
        if !self.inner.config.autosave {
            return;
        }
        let handle: Weak<Inner> = Arc::downgrade(&self.inner);
        state.autosave.schedule(Box::pin(async move {
            let Some(inner) = handle.upgrade() else {
                return;
            };
            let controller = InspectionController { inner };
            if !controller.is_dirty().await {
                return;
            }
            if let Err(e) = controller.save_progress().await {
                warn!("Autosave failed: {}", e);
            }
        }));
    }

    //=====================================================================================
    // Persistence
    //=====================================================================================

    /// Saves the current readings and remarks as a draft.
    ///
    /// May run concurrently with an autosave; both write the same store and
    /// the last write wins.
    pub async fn save_progress(&self) -> SessionResult<chrono::DateTime<Utc>> {
        let (generation, inspection_id, pending) = {
            let mut state = self.inner.state.lock().await;
            let generation = state.generation;
            let session = state.session.as_mut().ok_or(SessionError::NotLoaded)?;
            (generation, session.inspection_id(), session.begin_save()?)
        };

        let outcome = self
            .inner
            .repository
            .save_draft_readings(inspection_id, &pending.draft)
            .await;

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            debug!("Discarding stale save of inspection {}", inspection_id);
            return Err(SessionError::Superseded);
        }
        let session = state.session.as_mut().ok_or(SessionError::Superseded)?;
        let result = session.finish_save(pending.revision, outcome, Utc::now());
        match &result {
            Ok(_) => debug!("Saved draft of inspection {}", inspection_id),
            Err(e) => warn!("Saving inspection {} failed: {}", inspection_id, e),
        }
        result
    }

    /// Submits the inspection. Refused while readings are missing; on success
    /// the session becomes read-only.
    pub async fn submit(&self) -> SessionResult<SubmissionAck> {
        let (generation, inspection_id, submission) = {
            let mut state = self.inner.state.lock().await;
            let generation = state.generation;
            let session = state.session.as_mut().ok_or(SessionError::NotLoaded)?;
            let inspection_id = session.inspection_id();
            let submission = session.begin_submit(Utc::now())?;
            state.autosave.cancel();
            (generation, inspection_id, submission)
        };
        info!("Submitting inspection {}", inspection_id);

        let outcome = self
            .inner
            .repository
            .submit_inspection(inspection_id, &submission)
            .await;

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            debug!("Discarding stale submit of inspection {}", inspection_id);
            return Err(SessionError::Superseded);
        }
        let session = state.session.as_mut().ok_or(SessionError::Superseded)?;
        let result = session.finish_submit(outcome);
        match &result {
            Ok(ack) => info!("Inspection {} submitted ({:?})", inspection_id, ack.id),
            Err(e) => warn!("Submitting inspection {} failed: {}", inspection_id, e),
        }
        result
    }

    //=====================================================================================
    // Projections
    //=====================================================================================

    pub async fn phase(&self) -> SessionPhase {
        let state = self.inner.state.lock().await;
        match &state.session {
            Some(session) => session.phase(),
            None if state.loading => SessionPhase::Loading,
            None => SessionPhase::Unloaded,
        }
    }

    /// True if both handles drive the same session.
    pub fn same_session(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub async fn inspection_id(&self) -> Option<Uuid> {
        self.inner.state.lock().await.inspection_id
    }

    pub async fn load_error(&self) -> Option<String> {
        self.inner.state.lock().await.load_error.clone()
    }

    pub async fn is_dirty(&self) -> bool {
        let state = self.inner.state.lock().await;
        state.session.as_ref().is_some_and(|s| s.is_dirty())
    }

    pub async fn stats(&self) -> Option<InspectionStats> {
        let state = self.inner.state.lock().await;
        state.session.as_ref().map(|s| s.stats())
    }

    pub async fn completeness(&self) -> Option<CompletenessReport> {
        let state = self.inner.state.lock().await;
        state.session.as_ref().map(|s| s.completeness())
    }

    /// A copy of the session for presentation.
    pub async fn snapshot(&self) -> Option<InspectionSession> {
        let state = self.inner.state.lock().await;
        state.session.clone()
    }
}

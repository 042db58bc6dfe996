//! crates/qc_inspection_core/src/error.rs

use crate::ports::PortError;

/// Why a session operation did not go through. None of these are fatal; the
/// in-memory readings are kept and the caller may retry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("No inspection is loaded")]
    NotLoaded,

    #[error("Inspection has already been submitted")]
    AlreadySubmitted,

    #[error("Inspection is already being submitted")]
    SubmitInProgress,

    #[error("{missing} reading(s) are still missing")]
    Incomplete { missing: usize },

    #[error("No inspection form is registered for part code {0}")]
    NoForm(String),

    /// The session was replaced or closed while the call was in flight.
    #[error("Inspection session was superseded")]
    Superseded,

    #[error(transparent)]
    Port(#[from] PortError),
}

pub type SessionResult<T> = Result<T, SessionError>;

pub mod aggregator;
pub mod autosave;
pub mod completeness;
pub mod controller;
pub mod domain;
pub mod error;
pub mod forms;
pub mod ports;
pub mod session;
pub mod stats;
pub mod tolerance;
pub mod validator;

pub use aggregator::calculate_checkpoint_result;
pub use completeness::{check_readings_complete, CompletenessReport, MissingReading};
pub use controller::{InspectionController, SessionConfig, DEFAULT_AUTOSAVE_DELAY};
pub use domain::{
    BatchInfo, CheckpointDefinition, CheckpointKind, CheckpointResult, CheckpointResultMap,
    CheckpointVerdict, DraftReadings, InspectionForm, InspectionStats, InspectionSubmission,
    LoadedInspection, MeasurementLimits, ReadingStatus, ReadingValue, SampleReading,
    SavedReadings, SubmissionAck, VisualVerdict,
};
pub use error::{SessionError, SessionResult};
pub use forms::FormRegistry;
pub use ports::{FormLookup, InspectionRepository, PortError, PortResult};
pub use session::{InspectionSession, SessionPhase};
pub use tolerance::{parse_specification, parse_tolerance, Specification, Tolerance};
pub use validator::{resolve_limits, validate_reading, Limits};

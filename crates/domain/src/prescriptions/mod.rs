/// Prescription form aggregate
pub mod aggregate;

/// Commands
pub mod commands;

/// Events
pub mod events;

/// Draft payload and server verdicts
pub mod inputs;

/// Panel driver
pub mod panel;

/// View (read model)
pub mod view;

pub use aggregate::{
    DuplicatePolicy, FormState, Notice, NoticeLevel, PrescriptionForm, Services, AGGREGATE_TYPE,
};
pub use commands::Command;
pub use events::Event;
pub use inputs::{DraftField, PrescriptionDraft, PrescriptionResult, SubmissionOutcome};
pub use panel::{PrescriptionPanel, SubmitOutcome};
pub use view::{ConflictView, FormView, MedicationRow, PanelView};

use serde::{Deserialize, Serialize};

use super::inputs::{DraftField, SubmissionOutcome};
use crate::{api::MedicationId, medications::Medication};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum Command {
    /// Open the "add prescription" form with a fresh draft
    OpenForm,

    /// Edit one draft field
    SetField {
        field: DraftField,
        value: String,
    },

    /// Edit the override justification while conflicts are shown
    SetJustification {
        text: String,
    },

    /// Submit the draft without override
    Submit,

    /// Resubmit the conflicting draft with override and justification
    OverrideSubmit,

    /// Record the server's answer to an outstanding submission
    Resolve {
        attempt: u32,
        outcome: SubmissionOutcome,
    },

    /// Discard the draft and any conflict state
    Cancel,

    /// Replace the loaded medication list with a fresh server copy
    RefreshMedications {
        medications: Vec<Medication>,
    },

    /// Note a medication removed on the server
    AcknowledgeDeletion {
        medication_id: MedicationId,
    },

    /// Surface a failed list/delete request
    RecordRequestFailure {
        message: String,
    },
}

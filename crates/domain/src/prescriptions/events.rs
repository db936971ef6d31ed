use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use super::inputs::{DraftField, PrescriptionDraft};
use crate::{api::MedicationId, medications::Medication};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    FormOpened {
        draft: PrescriptionDraft,
        updated_at: DateTime<Utc>,
    },

    FieldChanged {
        field: DraftField,
        value: String,
        updated_at: DateTime<Utc>,
    },

    JustificationChanged {
        text: String,
        updated_at: DateTime<Utc>,
    },

    DraftSubmitted {
        attempt: u32,
        draft: PrescriptionDraft,
        updated_at: DateTime<Utc>,
    },

    OverrideSubmitted {
        attempt: u32,
        draft: PrescriptionDraft, // carries override + justification
        updated_at: DateTime<Utc>,
    },

    ConflictsReported {
        attempt: u32,
        messages: Vec<String>,
        updated_at: DateTime<Utc>,
    },

    PrescriptionAccepted {
        attempt: u32,
        prescription: Medication,
        overridden: bool,
        updated_at: DateTime<Utc>,
    },

    SubmissionFailed {
        attempt: u32,
        message: String,
        updated_at: DateTime<Utc>,
    },

    FormCancelled {
        abandoned_attempt: Option<u32>,
        updated_at: DateTime<Utc>,
    },

    MedicationsRefreshed {
        medications: Vec<Medication>,
        updated_at: DateTime<Utc>,
    },

    MedicationDeleted {
        medication_id: MedicationId,
        updated_at: DateTime<Utc>,
    },

    RequestFailed {
        message: String,
        updated_at: DateTime<Utc>,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::FormOpened { .. } => "PrescriptionForm:Opened".to_string(),
            Event::FieldChanged { .. } => "PrescriptionForm:FieldChanged".to_string(),
            Event::JustificationChanged { .. } => {
                "PrescriptionForm:JustificationChanged".to_string()
            }
            Event::DraftSubmitted { .. } => "PrescriptionForm:Submitted".to_string(),
            Event::OverrideSubmitted { .. } => "PrescriptionForm:OverrideSubmitted".to_string(),
            Event::ConflictsReported { .. } => "PrescriptionForm:ConflictsReported".to_string(),
            Event::PrescriptionAccepted { .. } => "PrescriptionForm:Accepted".to_string(),
            Event::SubmissionFailed { .. } => "PrescriptionForm:SubmissionFailed".to_string(),
            Event::FormCancelled { .. } => "PrescriptionForm:Cancelled".to_string(),
            Event::MedicationsRefreshed { .. } => "Medications:Refreshed".to_string(),
            Event::MedicationDeleted { .. } => "Medications:Deleted".to_string(),
            Event::RequestFailed { .. } => "Medications:RequestFailed".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}

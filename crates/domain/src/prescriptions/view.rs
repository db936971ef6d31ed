use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DraftField, FormState, Notice, NoticeLevel, PrescriptionDraft, PrescriptionForm};
use crate::{api::MedicationId, medications::Medication};

const EMPTY_CELL: &str = "—";

/// Read model of the prescription panel, as rendered to the user.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct PanelView {
    pub phase: String,
    /// Present only while a draft is open; conflicts live inside it.
    pub form: Option<FormView>,
    pub medications: Vec<MedicationRow>,
    pub notice: Option<Notice>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct FormView {
    pub draft: PrescriptionDraft,
    pub busy: bool,
    pub conflicts: Option<ConflictView>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct ConflictView {
    pub messages: Vec<String>,
    pub justification: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct MedicationRow {
    pub id: MedicationId,
    pub drug: String,
    pub dose: String,
    pub frequency: String,
    pub duration: String,
    pub route: String,
    pub notes: String,
    pub conflict: String,
}

impl From<&Medication> for MedicationRow {
    fn from(med: &Medication) -> Self {
        let conflict = if med.conflict_flag {
            let details = med
                .conflict_details
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or("Conflict");
            format!("⚠️ {details}")
        } else {
            EMPTY_CELL.to_string()
        };

        Self {
            id: med.id,
            drug: med.drug_name.clone(),
            dose: med.dose.clone(),
            frequency: med.frequency.clone(),
            duration: med.duration.clone(),
            route: or_placeholder(med.route.as_deref()),
            notes: or_placeholder(med.notes.as_deref()),
            conflict,
        }
    }
}

fn or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => EMPTY_CELL.to_string(),
    }
}

impl From<&PrescriptionForm> for PanelView {
    fn from(form: &PrescriptionForm) -> Self {
        let form_view = match &form.state {
            FormState::Idle | FormState::Accepted { .. } => None,
            FormState::Drafting { draft } => Some(FormView {
                draft: draft.clone(),
                busy: false,
                conflicts: None,
            }),
            FormState::Submitted {
                draft,
                conflicts,
                justification,
                ..
            } => Some(FormView {
                draft: draft.without_override(),
                busy: true,
                conflicts: justification.as_ref().map(|justification| ConflictView {
                    messages: conflicts.clone(),
                    justification: justification.clone(),
                }),
            }),
            FormState::ConflictPresented {
                draft,
                conflicts,
                justification,
            } => Some(FormView {
                draft: draft.clone(),
                busy: false,
                conflicts: Some(ConflictView {
                    messages: conflicts.clone(),
                    justification: justification.clone(),
                }),
            }),
        };

        Self {
            phase: form.state.name().to_string(),
            form: form_view,
            medications: form.medications.iter().map(MedicationRow::from).collect(),
            notice: form.notice.clone(),
        }
    }
}

impl fmt::Display for PanelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Prescriptions [{}]", self.phase)?;

        if let Some(notice) = &self.notice {
            let tag = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Error => "error",
            };
            writeln!(f, "({tag}) {}", notice.text)?;
        }

        if let Some(form) = &self.form {
            writeln!(
                f,
                "New Prescription{}",
                if form.busy { " (submitting…)" } else { "" }
            )?;
            for field in DraftField::ALL {
                let marker = if field.is_required() { " *" } else { "" };
                writeln!(f, "  {}{}: {}", field.label(), marker, form.draft.get(field))?;
            }

            if let Some(conflicts) = &form.conflicts {
                writeln!(f, "⚠️ Conflicts Detected")?;
                for message in &conflicts.messages {
                    writeln!(f, "  - {message}")?;
                }
                writeln!(f, "  Override Justification *: {}", conflicts.justification)?;
            }
        }

        writeln!(f, "Current Medications")?;
        if self.medications.is_empty() {
            writeln!(f, "  No medications on record.")?;
        }
        for row in &self.medications {
            writeln!(
                f,
                "  #{} {} | {} | {} | {} | {} | {} | {}",
                row.id,
                row.drug,
                row.dose,
                row.frequency,
                row.duration,
                row.route,
                row.notes,
                row.conflict
            )?;
        }
        Ok(())
    }
}

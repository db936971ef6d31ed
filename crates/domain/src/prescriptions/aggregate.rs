use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};

use crate::{errors::Error, medications::Medication};

use super::{Command, Event, PrescriptionDraft, SubmissionOutcome};

pub const PRESCRIPTION_ADDED_MESSAGE: &str = "Prescription added successfully!";
pub const PRESCRIPTION_OVERRIDDEN_MESSAGE: &str = "Prescription added with override!";
pub const MEDICATION_DELETED_MESSAGE: &str = "Medication deleted";

/// Prescription form workflow state
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FormState {
    /// No form open
    #[default]
    Idle,
    /// Form open, draft being edited
    Drafting { draft: PrescriptionDraft },
    /// Request in flight; `justification` is set for override attempts
    Submitted {
        attempt: u32,
        draft: PrescriptionDraft,
        conflicts: Vec<String>,
        justification: Option<String>,
    },
    /// Server reported conflicts, waiting for override or cancel
    ConflictPresented {
        draft: PrescriptionDraft,
        conflicts: Vec<String>,
        justification: String,
    },
    /// Prescription created on the server
    Accepted { prescription: Medication },
}

impl FormState {
    pub fn name(&self) -> &'static str {
        match self {
            FormState::Idle => "idle",
            FormState::Drafting { .. } => "drafting",
            FormState::Submitted { .. } => "submitted",
            FormState::ConflictPresented { .. } => "conflict_presented",
            FormState::Accepted { .. } => "accepted",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    #[default]
    Info,
    Error,
}

/// Message shown above the panel after the last operation.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Prescription form aggregate for one patient panel
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct PrescriptionForm {
    pub updated_at: DateTime<Utc>,
    pub state: FormState,

    /// Last medication list fetched from the server
    pub medications: Vec<Medication>,
    /// Set once the list has been fetched at least once
    pub medications_loaded: bool,

    pub notice: Option<Notice>,

    /// Number of submissions issued so far
    pub attempts: u32,
}

/// Local guard against prescribing a drug already on the list.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Block any drug already on the list, whatever its dose.
    #[default]
    SameDrug,
    /// Block only when drug and dose both match.
    SameDrugAndDose,
    /// Leave duplicates to the server's conflict check.
    Disabled,
}

pub const AGGREGATE_TYPE: &str = "PrescriptionForm";

#[derive(Clone, Debug, Default)]
pub struct Services {
    pub duplicate_policy: DuplicatePolicy,
}

#[async_trait]
impl Aggregate for PrescriptionForm {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();

        match command {
            Command::OpenForm => match self.state {
                FormState::Idle | FormState::Accepted { .. } => Ok(vec![Event::FormOpened {
                    draft: PrescriptionDraft::default(),
                    updated_at: now,
                }]),
                _ => Err(self.invalid_transition("drafting")),
            },

            Command::SetField { field, value } => match self.state {
                FormState::Drafting { .. } => Ok(vec![Event::FieldChanged {
                    field,
                    value,
                    updated_at: now,
                }]),
                _ => Err(self.invalid_transition("drafting")),
            },

            Command::SetJustification { text } => match self.state {
                FormState::ConflictPresented { .. } => Ok(vec![Event::JustificationChanged {
                    text,
                    updated_at: now,
                }]),
                _ => Err(self.invalid_transition("conflict_presented")),
            },

            Command::Submit => {
                let FormState::Drafting { draft } = &self.state else {
                    return Err(self.invalid_transition("submitted"));
                };
                self.validate_draft(draft)?;
                if services.duplicate_policy != DuplicatePolicy::Disabled
                    && !self.medications_loaded
                {
                    return Err(Error::MedicationsNotLoaded);
                }
                self.validate_not_duplicate(draft, services.duplicate_policy)?;

                Ok(vec![Event::DraftSubmitted {
                    attempt: self.attempts + 1,
                    draft: draft.without_override(),
                    updated_at: now,
                }])
            }

            Command::OverrideSubmit => {
                let FormState::ConflictPresented {
                    draft,
                    justification,
                    ..
                } = &self.state
                else {
                    return Err(self.invalid_transition("submitted"));
                };
                if justification.trim().is_empty() {
                    return Err(Error::MissingJustification);
                }

                Ok(vec![Event::OverrideSubmitted {
                    attempt: self.attempts + 1,
                    draft: draft.with_override(justification),
                    updated_at: now,
                }])
            }

            Command::Resolve { attempt, outcome } => {
                if self.pending_attempt() != Some(attempt) {
                    return Err(Error::StaleVerdict { attempt });
                }
                let overridden = matches!(
                    self.state,
                    FormState::Submitted {
                        justification: Some(_),
                        ..
                    }
                );

                let event = match outcome {
                    SubmissionOutcome::Conflicts { messages } => Event::ConflictsReported {
                        attempt,
                        messages,
                        updated_at: now,
                    },
                    SubmissionOutcome::Created { prescription } => Event::PrescriptionAccepted {
                        attempt,
                        prescription,
                        overridden,
                        updated_at: now,
                    },
                    SubmissionOutcome::Failed { message } => Event::SubmissionFailed {
                        attempt,
                        message,
                        updated_at: now,
                    },
                };
                Ok(vec![event])
            }

            Command::Cancel => {
                let abandoned_attempt = match &self.state {
                    FormState::Idle => return Err(self.invalid_transition("idle")),
                    FormState::Submitted { attempt, .. } => Some(*attempt),
                    _ => None,
                };

                Ok(vec![Event::FormCancelled {
                    abandoned_attempt,
                    updated_at: now,
                }])
            }

            Command::RefreshMedications { medications } => Ok(vec![Event::MedicationsRefreshed {
                medications,
                updated_at: now,
            }]),

            Command::AcknowledgeDeletion { medication_id } => Ok(vec![Event::MedicationDeleted {
                medication_id,
                updated_at: now,
            }]),

            Command::RecordRequestFailure { message } => Ok(vec![Event::RequestFailed {
                message,
                updated_at: now,
            }]),
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::FormOpened { draft, updated_at } => {
                self.state = FormState::Drafting { draft };
                self.notice = None;
                self.updated_at = updated_at;
            }

            Event::FieldChanged {
                field,
                value,
                updated_at,
            } => {
                if let FormState::Drafting { draft } = &mut self.state {
                    draft.set(field, value);
                }
                self.updated_at = updated_at;
            }

            Event::JustificationChanged { text, updated_at } => {
                if let FormState::ConflictPresented { justification, .. } = &mut self.state {
                    *justification = text;
                }
                self.updated_at = updated_at;
            }

            Event::DraftSubmitted {
                attempt,
                draft,
                updated_at,
            } => {
                self.attempts = attempt;
                self.state = FormState::Submitted {
                    attempt,
                    draft,
                    conflicts: Vec::new(),
                    justification: None,
                };
                self.notice = None;
                self.updated_at = updated_at;
            }

            Event::OverrideSubmitted {
                attempt,
                draft,
                updated_at,
            } => {
                let conflicts = match std::mem::take(&mut self.state) {
                    FormState::ConflictPresented { conflicts, .. } => conflicts,
                    _ => Vec::new(),
                };
                self.attempts = attempt;
                self.state = FormState::Submitted {
                    attempt,
                    justification: draft.override_justification.clone(),
                    draft,
                    conflicts,
                };
                self.notice = None;
                self.updated_at = updated_at;
            }

            Event::ConflictsReported {
                messages,
                updated_at,
                ..
            } => {
                if let FormState::Submitted {
                    draft,
                    justification,
                    ..
                } = std::mem::take(&mut self.state)
                {
                    self.state = FormState::ConflictPresented {
                        draft: draft.without_override(),
                        conflicts: messages,
                        justification: justification.unwrap_or_default(),
                    };
                }
                self.updated_at = updated_at;
            }

            Event::PrescriptionAccepted {
                prescription,
                overridden,
                updated_at,
                ..
            } => {
                self.state = FormState::Accepted { prescription };
                self.notice = Some(Notice::info(if overridden {
                    PRESCRIPTION_OVERRIDDEN_MESSAGE
                } else {
                    PRESCRIPTION_ADDED_MESSAGE
                }));
                self.updated_at = updated_at;
            }

            Event::SubmissionFailed {
                message,
                updated_at,
                ..
            } => {
                if let FormState::Submitted {
                    draft,
                    conflicts,
                    justification,
                    ..
                } = std::mem::take(&mut self.state)
                {
                    self.state = match justification {
                        Some(justification) => FormState::ConflictPresented {
                            draft: draft.without_override(),
                            conflicts,
                            justification,
                        },
                        None => FormState::Drafting { draft },
                    };
                }
                self.notice = Some(Notice::error(message));
                self.updated_at = updated_at;
            }

            Event::FormCancelled { updated_at, .. } => {
                self.state = FormState::Idle;
                self.notice = None;
                self.updated_at = updated_at;
            }

            Event::MedicationsRefreshed {
                medications,
                updated_at,
            } => {
                self.medications = medications;
                self.medications_loaded = true;
                self.updated_at = updated_at;
            }

            Event::MedicationDeleted { updated_at, .. } => {
                self.notice = Some(Notice::info(MEDICATION_DELETED_MESSAGE));
                self.updated_at = updated_at;
            }

            Event::RequestFailed {
                message,
                updated_at,
            } => {
                self.notice = Some(Notice::error(message));
                self.updated_at = updated_at;
            }
        }
    }
}

impl PrescriptionForm {
    pub fn is_busy(&self) -> bool {
        matches!(self.state, FormState::Submitted { .. })
    }

    /// Attempt number of the request currently in flight, if any.
    pub fn pending_attempt(&self) -> Option<u32> {
        match self.state {
            FormState::Submitted { attempt, .. } => Some(attempt),
            _ => None,
        }
    }

    fn invalid_transition(&self, to: &str) -> Error {
        Error::InvalidStateTransition {
            from: self.state.name().to_string(),
            to: to.to_string(),
        }
    }

    fn validate_draft(&self, draft: &PrescriptionDraft) -> Result<(), Error> {
        match draft.missing_field() {
            Some(field) => Err(Error::MissingField { field }),
            None => Ok(()),
        }
    }

    fn validate_not_duplicate(
        &self,
        draft: &PrescriptionDraft,
        policy: DuplicatePolicy,
    ) -> Result<(), Error> {
        let duplicate = self.medications.iter().any(|existing| match policy {
            DuplicatePolicy::SameDrug => existing.is_same_drug(&draft.drug_name),
            DuplicatePolicy::SameDrugAndDose => {
                existing.is_same_drug(&draft.drug_name) && existing.is_same_dose(&draft.dose)
            }
            DuplicatePolicy::Disabled => false,
        });

        if duplicate {
            return Err(Error::DuplicatePrescription {
                drug_name: draft.drug_name.trim().to_string(),
            });
        }
        Ok(())
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{catalog::Route, errors::Error, medications::Medication};

/// Editable fields of the prescription form.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    DrugName,
    Dose,
    Frequency,
    Duration,
    Route,
    Notes,
}

impl DraftField {
    /// Form order.
    pub const ALL: [DraftField; 6] = [
        DraftField::DrugName,
        DraftField::Dose,
        DraftField::Frequency,
        DraftField::Duration,
        DraftField::Route,
        DraftField::Notes,
    ];

    /// Fields that must be non-empty before a draft may be sent.
    pub const REQUIRED: [DraftField; 5] = [
        DraftField::DrugName,
        DraftField::Dose,
        DraftField::Frequency,
        DraftField::Duration,
        DraftField::Route,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DraftField::DrugName => "Drug Name",
            DraftField::Dose => "Dose",
            DraftField::Frequency => "Frequency",
            DraftField::Duration => "Duration",
            DraftField::Route => "Route",
            DraftField::Notes => "Notes",
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, DraftField::Notes)
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DraftField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drug" | "drug_name" | "drugname" => Ok(DraftField::DrugName),
            "dose" => Ok(DraftField::Dose),
            "frequency" | "freq" => Ok(DraftField::Frequency),
            "duration" => Ok(DraftField::Duration),
            "route" => Ok(DraftField::Route),
            "notes" | "note" => Ok(DraftField::Notes),
            other => Err(Error::Validation {
                message: format!("Unknown field: {other}"),
            }),
        }
    }
}

/// Prescription as sent to `POST …/prescriptions`.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct PrescriptionDraft {
    pub drug_name: String,
    pub dose: String,
    pub frequency: String,
    pub duration: String,
    pub route: String,
    pub notes: String,
    #[serde(rename = "is_perscription", alias = "is_prescription")]
    pub is_prescription: bool,
    pub status: bool,
    #[serde(rename = "override")]
    pub override_conflicts: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_justification: Option<String>,
}

impl Default for PrescriptionDraft {
    fn default() -> Self {
        Self {
            drug_name: String::new(),
            dose: String::new(),
            frequency: String::new(),
            duration: String::new(),
            route: Route::default().as_str().to_string(),
            notes: String::new(),
            is_prescription: true,
            status: true,
            override_conflicts: false,
            override_justification: None,
        }
    }
}

impl PrescriptionDraft {
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::DrugName => &self.drug_name,
            DraftField::Dose => &self.dose,
            DraftField::Frequency => &self.frequency,
            DraftField::Duration => &self.duration,
            DraftField::Route => &self.route,
            DraftField::Notes => &self.notes,
        }
    }

    pub fn set(&mut self, field: DraftField, value: String) {
        let slot = match field {
            DraftField::DrugName => &mut self.drug_name,
            DraftField::Dose => &mut self.dose,
            DraftField::Frequency => &mut self.frequency,
            DraftField::Duration => &mut self.duration,
            DraftField::Route => &mut self.route,
            DraftField::Notes => &mut self.notes,
        };
        *slot = value;
    }

    /// First required field that is empty or whitespace.
    pub fn missing_field(&self) -> Option<DraftField> {
        DraftField::ALL
            .into_iter()
            .filter(DraftField::is_required)
            .find(|field| self.get(*field).trim().is_empty())
    }

    pub fn with_override(&self, justification: &str) -> Self {
        Self {
            override_conflicts: true,
            override_justification: Some(justification.to_string()),
            ..self.clone()
        }
    }

    pub fn without_override(&self) -> Self {
        Self {
            override_conflicts: false,
            override_justification: None,
            ..self.clone()
        }
    }
}

/// Body of a `POST …/prescriptions` response.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct PrescriptionResult {
    #[serde(default, deserialize_with = "crate::medications::null_as_default")]
    pub conflicts: bool,
    #[serde(default, deserialize_with = "crate::medications::null_as_default")]
    pub conflict_messages: Vec<String>,
    #[serde(default)]
    pub prescription: Option<Medication>,
}

pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response from server";
pub const OVERRIDE_REJECTED_MESSAGE: &str = "Failed to override conflicts";

impl PrescriptionResult {
    /// Interpret the response for a plain (`overriding == false`) or override submission.
    ///
    /// A plain submission treats a flagged, non-empty message list as a
    /// conflict verdict before looking for a created prescription. An override
    /// submission only succeeds with a created prescription.
    pub fn into_outcome(self, overriding: bool) -> SubmissionOutcome {
        if !overriding && self.conflicts && !self.conflict_messages.is_empty() {
            return SubmissionOutcome::Conflicts {
                messages: self.conflict_messages,
            };
        }
        match self.prescription {
            Some(prescription) => SubmissionOutcome::Created { prescription },
            None if overriding => SubmissionOutcome::Failed {
                message: OVERRIDE_REJECTED_MESSAGE.to_string(),
            },
            None => SubmissionOutcome::Failed {
                message: UNEXPECTED_RESPONSE_MESSAGE.to_string(),
            },
        }
    }
}

/// What came back for one submission attempt.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Conflicts { messages: Vec<String> },
    Created { prescription: Medication },
    Failed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_serializes_with_server_field_names() {
        let mut draft = PrescriptionDraft::default();
        draft.set(DraftField::DrugName, "Warfarin".to_string());

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["drug_name"], "Warfarin");
        assert_eq!(json["route"], "oral");
        assert_eq!(json["is_perscription"], true);
        assert_eq!(json["status"], true);
        assert_eq!(json["override"], false);
        assert!(json.get("override_justification").is_none());

        let json = serde_json::to_value(draft.with_override("benefit outweighs risk")).unwrap();
        assert_eq!(json["override"], true);
        assert_eq!(json["override_justification"], "benefit outweighs risk");
    }

    #[test]
    fn whitespace_only_field_counts_as_missing() {
        let mut draft = PrescriptionDraft::default();
        draft.set(DraftField::DrugName, "Naproxen".to_string());
        draft.set(DraftField::Dose, "250mg".to_string());
        draft.set(DraftField::Frequency, "   ".to_string());
        draft.set(DraftField::Duration, "5 days".to_string());

        assert_eq!(draft.missing_field(), Some(DraftField::Frequency));

        draft.set(DraftField::Frequency, "BID".to_string());
        assert_eq!(draft.missing_field(), None);
    }

    #[test]
    fn conflict_verdict_needs_flag_and_messages() {
        let result: PrescriptionResult = serde_json::from_str(
            r#"{"conflicts": true, "conflict_messages": ["X interacts with Y"], "prescription": null}"#,
        )
        .unwrap();
        assert_eq!(
            result.into_outcome(false),
            SubmissionOutcome::Conflicts {
                messages: vec!["X interacts with Y".to_string()]
            }
        );

        let empty: PrescriptionResult =
            serde_json::from_str(r#"{"conflicts": true, "conflict_messages": []}"#).unwrap();
        assert_eq!(
            empty.into_outcome(false),
            SubmissionOutcome::Failed {
                message: UNEXPECTED_RESPONSE_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn override_only_accepts_created_prescription() {
        let result = PrescriptionResult {
            conflicts: true,
            conflict_messages: vec!["still conflicting".to_string()],
            prescription: None,
        };
        assert_eq!(
            result.into_outcome(true),
            SubmissionOutcome::Failed {
                message: OVERRIDE_REJECTED_MESSAGE.to_string()
            }
        );

        let created: PrescriptionResult = serde_json::from_str(
            r#"{"conflicts": true, "conflict_messages": ["kept"], "prescription": {"id": 9, "drug_name": "Aspirin"}}"#,
        )
        .unwrap();
        assert!(matches!(
            created.into_outcome(true),
            SubmissionOutcome::Created { prescription } if prescription.id == 9
        ));
    }

    #[test]
    fn only_notes_are_optional() {
        let required: Vec<DraftField> = DraftField::ALL
            .into_iter()
            .filter(DraftField::is_required)
            .collect();
        assert_eq!(required, DraftField::REQUIRED.to_vec());
        assert!(!DraftField::Notes.is_required());
    }

    #[test]
    fn field_names_parse_from_console_input() {
        assert_eq!("drug".parse::<DraftField>().unwrap(), DraftField::DrugName);
        assert_eq!("Notes".parse::<DraftField>().unwrap(), DraftField::Notes);
        assert!("strength".parse::<DraftField>().is_err());
    }
}

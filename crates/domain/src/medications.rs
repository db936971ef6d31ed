use serde::{Deserialize, Deserializer, Serialize};

use crate::api::MedicationId;

/// Medication already on a patient's record, as returned by the server.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Medication {
    pub id: MedicationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drug_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dose: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frequency: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: String,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(
        default,
        rename = "is_perscription",
        alias = "is_prescription",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_prescription: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conflict_flag: bool,
    #[serde(default)]
    pub conflict_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_justification: Option<String>,
}

impl Medication {
    pub fn is_same_drug(&self, drug_name: &str) -> bool {
        normalize(&self.drug_name) == normalize(drug_name)
    }

    pub fn is_same_dose(&self, dose: &str) -> bool {
        normalize(&self.dose) == normalize(dose)
    }
}

/// Trimmed, lowercased form used for duplicate matching.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// The server emits `null` for unset optional fields.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

use serde::{Deserialize, Serialize};

/// Recorded allergy. Read-only here; the server checks prescriptions against it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Allergy {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub substance: Option<String>,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

impl Allergy {
    /// One-line summary, e.g. `Penicillin (severe): hives`.
    pub fn summary(&self) -> String {
        let substance = self.substance.as_deref().unwrap_or("Unknown substance");
        let mut line = match self.severity.as_deref() {
            Some(severity) if !severity.trim().is_empty() => format!("{substance} ({severity})"),
            _ => substance.to_string(),
        };
        if let Some(reaction) = self.reaction.as_deref().filter(|r| !r.trim().is_empty()) {
            line.push_str(": ");
            line.push_str(reaction);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_skips_missing_parts() {
        let allergy = Allergy {
            id: 4,
            substance: Some("Penicillin".to_string()),
            severity: Some("severe".to_string()),
            reaction: Some("hives".to_string()),
            ..Default::default()
        };
        assert_eq!(allergy.summary(), "Penicillin (severe): hives");

        let bare = Allergy {
            id: 5,
            substance: Some("Sulfa".to_string()),
            ..Default::default()
        };
        assert_eq!(bare.summary(), "Sulfa");
    }
}

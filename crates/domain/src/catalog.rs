use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Allergy substances known to the server's conflict checker.
pub const ALLERGY_SUBSTANCES: &[&str] = &[
    "Penicillin",
    "Cephalosporins",
    "Sulfa",
    "NSAIDs",
    "Aspirin",
    "Opioids",
    "StatinIntolerance",
    "BetaBlockers",
    "ThyroidHormone",
    "Insulin",
];

/// Prescribable medications referenced by the server's conflict rules.
pub const PRESCRIPTION_MEDICATIONS: &[&str] = &[
    "Penicillin",
    "Amoxicillin",
    "Ampicillin",
    "Oxacillin",
    "Piperacillin",
    "Cephalexin",
    "Ceftriaxone",
    "Cefuroxime",
    "Sulfamethoxazole",
    "Trimethoprim-Sulfamethoxazole",
    "Sulfasalazine",
    "Ibuprofen",
    "Naproxen",
    "Aspirin",
    "Diclofenac",
    "Indomethacin",
    "Morphine",
    "Codeine",
    "Oxycodone",
    "Hydrocodone",
    "Hydromorphone",
    "Atorvastatin",
    "Simvastatin",
    "Rosuvastatin",
    "Pravastatin",
    "Metoprolol",
    "Atenolol",
    "Propranolol",
    "Levothyroxine",
    "Liothyronine",
    "Insulin Glargine",
    "Insulin Lispro",
    "Insulin Aspart",
    "Warfarin",
    "Lisinopril",
    "Losartan",
    "Amlodipine",
    "Diazepam",
    "Gabapentin",
    "Sertraline",
    "Gemfibrozil",
];

/// Canonical catalog spelling of `name`, if the conflict checker knows it.
pub fn find_medication(name: &str) -> Option<&'static str> {
    let name = name.trim();
    PRESCRIPTION_MEDICATIONS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(name))
}

/// Administration route offered by the prescription form.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum Route {
    #[default]
    #[serde(rename = "oral")]
    Oral,
    #[serde(rename = "IV")]
    Intravenous,
    #[serde(rename = "IM")]
    Intramuscular,
    #[serde(rename = "topical")]
    Topical,
    #[serde(rename = "sublingual")]
    Sublingual,
    #[serde(rename = "inhaled")]
    Inhaled,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Oral,
        Route::Intravenous,
        Route::Intramuscular,
        Route::Topical,
        Route::Sublingual,
        Route::Inhaled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Oral => "oral",
            Route::Intravenous => "IV",
            Route::Intramuscular => "IM",
            Route::Topical => "topical",
            Route::Sublingual => "sublingual",
            Route::Inhaled => "inhaled",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Route::ALL
            .into_iter()
            .find(|route| route.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation {
                message: format!("Unknown route: {s}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_parse_case_insensitively() {
        assert_eq!("iv".parse::<Route>().unwrap(), Route::Intravenous);
        assert_eq!(" Oral ".parse::<Route>().unwrap(), Route::Oral);
        assert!("rectal".parse::<Route>().is_err());
    }

    #[test]
    fn route_wire_names_match_form_values() {
        assert_eq!(serde_json::to_string(&Route::Intramuscular).unwrap(), "\"IM\"");
        assert_eq!(Route::default().as_str(), "oral");
    }

    #[test]
    fn catalog_lookup_returns_canonical_spelling() {
        assert_eq!(find_medication("insulin glargine"), Some("Insulin Glargine"));
        assert_eq!(find_medication("Tylenol"), None);
    }
}

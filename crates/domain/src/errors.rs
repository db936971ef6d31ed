use thiserror::Error;

use crate::prescriptions::DraftField;

pub const DUPLICATE_PRESCRIPTION_MESSAGE: &str = "A prescription for this drug already exists. \
If you meant to add a different dosage/frequency, please edit or delete the existing prescription first.";

pub const MISSING_JUSTIFICATION_MESSAGE: &str =
    "Please provide a justification for overriding the conflict.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{} is required", field.label())]
    MissingField { field: DraftField },

    #[error("{}", DUPLICATE_PRESCRIPTION_MESSAGE)]
    DuplicatePrescription { drug_name: String },

    #[error("{}", MISSING_JUSTIFICATION_MESSAGE)]
    MissingJustification,

    #[error("Medication list has not been loaded; refresh before prescribing.")]
    MedicationsNotLoaded,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Stale verdict for submission attempt {attempt}")]
    StaleVerdict { attempt: u32 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Failure reported by the server, with its user-facing message.
    #[error("{message}")]
    Remote { message: String },

    /// Failure without a server message (connection, timeout, undecodable body).
    #[error("Request failed: {detail}")]
    Unavailable { detail: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl Error {
    /// True for errors raised before any request leaves the client.
    pub fn is_local(&self) -> bool {
        !matches!(self, Error::Remote { .. } | Error::Unavailable { .. })
    }

    /// Message to show for a failed request: the server's own text when it
    /// sent one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Remote { message } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
        }
    }
}

//! Patient Records Domain Models

/// Allergy records
pub mod allergies;

/// Remote records API seam
pub mod api;

/// Medication and allergy-substance catalog
pub mod catalog;

/// Domain errors
pub mod errors;

/// Domain events wrapper
pub mod event;

/// Medication records
pub mod medications;

/// Prescription form aggregate
pub mod prescriptions;

pub use api::{MedicationId, PatientId, ProviderId, RecordsApi};
pub use errors::Error;
pub use event::DomainEvent;

use async_trait::async_trait;

use crate::{
    allergies::Allergy,
    errors::Error,
    medications::Medication,
    prescriptions::{PrescriptionDraft, PrescriptionResult},
};

pub type PatientId = i64;
pub type ProviderId = i64;
pub type MedicationId = i64;

/// Remote patient-records service as seen by the prescription panel.
///
/// Implementations surface every failure as [`Error::Remote`] carrying the
/// message that should be shown to the user.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    async fn list_medications(&self, patient_id: PatientId) -> Result<Vec<Medication>, Error>;

    async fn create_prescription(
        &self,
        patient_id: PatientId,
        provider_id: ProviderId,
        draft: &PrescriptionDraft,
    ) -> Result<PrescriptionResult, Error>;

    async fn delete_medication(
        &self,
        patient_id: PatientId,
        medication_id: MedicationId,
    ) -> Result<(), Error>;

    async fn list_allergies(&self, patient_id: PatientId) -> Result<Vec<Allergy>, Error>;
}

#[async_trait]
impl<T: RecordsApi + ?Sized> RecordsApi for std::sync::Arc<T> {
    async fn list_medications(&self, patient_id: PatientId) -> Result<Vec<Medication>, Error> {
        (**self).list_medications(patient_id).await
    }

    async fn create_prescription(
        &self,
        patient_id: PatientId,
        provider_id: ProviderId,
        draft: &PrescriptionDraft,
    ) -> Result<PrescriptionResult, Error> {
        (**self)
            .create_prescription(patient_id, provider_id, draft)
            .await
    }

    async fn delete_medication(
        &self,
        patient_id: PatientId,
        medication_id: MedicationId,
    ) -> Result<(), Error> {
        (**self).delete_medication(patient_id, medication_id).await
    }

    async fn list_allergies(&self, patient_id: PatientId) -> Result<Vec<Allergy>, Error> {
        (**self).list_allergies(patient_id).await
    }
}

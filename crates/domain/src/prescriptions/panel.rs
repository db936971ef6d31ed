use std::collections::HashMap;

use cqrs_es::Aggregate;
use tracing::{debug, info, warn};
use ulid::Ulid;

use super::{
    Command, DraftField, DuplicatePolicy, Event, FormState, PanelView, PrescriptionForm,
    Services, SubmissionOutcome, AGGREGATE_TYPE,
};
use crate::{
    allergies::Allergy,
    api::{MedicationId, PatientId, ProviderId, RecordsApi},
    errors::Error,
    event::DomainEvent,
    medications::Medication,
};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load medications";
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create prescription";
pub const OVERRIDE_FAILED_MESSAGE: &str = "Failed to override prescription";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete medication";
pub const ALLERGIES_FAILED_MESSAGE: &str = "Failed to load allergies";

/// Journal entries kept per panel; older entries are dropped first.
pub const JOURNAL_CAPACITY: usize = 500;

/// Result of a submission that reached the server and got an answer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    Accepted(Medication),
    Conflicts(Vec<String>),
}

/// Prescription panel for one patient: drives the form aggregate against the
/// records API and keeps a journal of every applied event.
pub struct PrescriptionPanel<A> {
    api: A,
    patient_id: PatientId,
    provider_id: ProviderId,
    aggregate_id: String,
    services: Services,
    form: PrescriptionForm,
    journal: Vec<DomainEvent>,
    journal_capacity: usize,
    sequence: usize,
}

impl<A: RecordsApi> PrescriptionPanel<A> {
    pub fn new(api: A, patient_id: PatientId, provider_id: ProviderId) -> Self {
        Self {
            api,
            patient_id,
            provider_id,
            aggregate_id: format!("patient-{patient_id}"),
            services: Services::default(),
            form: PrescriptionForm::default(),
            journal: Vec::new(),
            journal_capacity: JOURNAL_CAPACITY,
            sequence: 0,
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.services.duplicate_policy = policy;
        self
    }

    pub fn with_journal_capacity(mut self, capacity: usize) -> Self {
        self.journal_capacity = capacity.max(1);
        self
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    pub fn form(&self) -> &PrescriptionForm {
        &self.form
    }

    /// Most recent applied events, oldest first.
    pub fn journal(&self) -> &[DomainEvent] {
        &self.journal
    }

    pub fn view(&self) -> PanelView {
        PanelView::from(&self.form)
    }

    /// Handle `command` against the current form and apply the resulting events.
    pub async fn execute(&mut self, command: Command) -> Result<Vec<Event>, Error> {
        let events = self.form.handle(command, &self.services).await?;

        let mut metadata = HashMap::new();
        metadata.insert("command_id".to_string(), Ulid::new().to_string());
        metadata.insert("patient_id".to_string(), self.patient_id.to_string());

        for event in &events {
            let envelope = DomainEvent::wrap(
                &self.aggregate_id,
                AGGREGATE_TYPE,
                self.sequence + 1,
                event,
                &metadata,
            )?;
            debug!(
                "Applying {} #{} for {}",
                envelope.event_type, envelope.sequence, envelope.id
            );
            self.sequence = envelope.sequence;
            self.journal.push(envelope);
            self.form.apply(event.clone());
        }

        if self.journal.len() > self.journal_capacity {
            let excess = self.journal.len() - self.journal_capacity;
            self.journal.drain(..excess);
        }

        Ok(events)
    }

    /// Re-fetch the medication list and replace the local copy.
    pub async fn load(&mut self) -> Result<(), Error> {
        match self.api.list_medications(self.patient_id).await {
            Ok(medications) => {
                info!(
                    "Loaded {} medications for patient {}",
                    medications.len(),
                    self.patient_id
                );
                self.execute(Command::RefreshMedications { medications })
                    .await?;
                Ok(())
            }
            Err(err) => Err(self.record_failure(&err, LOAD_FAILED_MESSAGE).await),
        }
    }

    pub async fn open_form(&mut self) -> Result<(), Error> {
        self.execute(Command::OpenForm).await.map(drop)
    }

    pub async fn set_field(
        &mut self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), Error> {
        self.execute(Command::SetField {
            field,
            value: value.into(),
        })
        .await
        .map(drop)
    }

    pub async fn set_justification(&mut self, text: impl Into<String>) -> Result<(), Error> {
        self.execute(Command::SetJustification { text: text.into() })
            .await
            .map(drop)
    }

    pub async fn cancel(&mut self) -> Result<(), Error> {
        self.execute(Command::Cancel).await.map(drop)
    }

    /// Submit the open draft. Validation and the duplicate guard run before any request.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, Error> {
        self.execute(Command::Submit).await?;
        self.dispatch_pending(false).await
    }

    /// Resubmit the conflicting draft with override and the entered justification.
    pub async fn submit_override(&mut self) -> Result<SubmitOutcome, Error> {
        self.execute(Command::OverrideSubmit).await?;
        self.dispatch_pending(true).await
    }

    pub async fn delete_medication(&mut self, medication_id: MedicationId) -> Result<(), Error> {
        if let Err(err) = self
            .api
            .delete_medication(self.patient_id, medication_id)
            .await
        {
            return Err(self.record_failure(&err, DELETE_FAILED_MESSAGE).await);
        }

        info!(
            "Deleted medication {} for patient {}",
            medication_id, self.patient_id
        );
        self.execute(Command::AcknowledgeDeletion { medication_id })
            .await?;
        self.refresh_after_change().await;
        Ok(())
    }

    pub async fn load_allergies(&self) -> Result<Vec<Allergy>, Error> {
        self.api
            .list_allergies(self.patient_id)
            .await
            .map_err(|err| Error::Remote {
                message: err.user_message(ALLERGIES_FAILED_MESSAGE),
            })
    }

    async fn dispatch_pending(&mut self, overriding: bool) -> Result<SubmitOutcome, Error> {
        let (attempt, draft) = match &self.form.state {
            FormState::Submitted { attempt, draft, .. } => (*attempt, draft.clone()),
            other => {
                return Err(Error::InvalidStateTransition {
                    from: other.name().to_string(),
                    to: "submitted".to_string(),
                })
            }
        };

        info!(
            "Submitting {} for patient {} (attempt {}, override: {})",
            draft.drug_name, self.patient_id, attempt, overriding
        );

        let fallback = if overriding {
            OVERRIDE_FAILED_MESSAGE
        } else {
            CREATE_FAILED_MESSAGE
        };
        let outcome = match self
            .api
            .create_prescription(self.patient_id, self.provider_id, &draft)
            .await
        {
            Ok(result) => result.into_outcome(overriding),
            Err(err) => {
                warn!("Prescription request failed: {}", err);
                SubmissionOutcome::Failed {
                    message: err.user_message(fallback),
                }
            }
        };

        if let Err(err) = self
            .execute(Command::Resolve {
                attempt,
                outcome: outcome.clone(),
            })
            .await
        {
            warn!("Discarding verdict for attempt {}: {}", attempt, err);
            return Err(err);
        }

        match outcome {
            SubmissionOutcome::Conflicts { messages } => {
                info!("Server reported {} conflicts", messages.len());
                Ok(SubmitOutcome::Conflicts(messages))
            }
            SubmissionOutcome::Created { prescription } => {
                info!("Prescription {} created", prescription.id);
                self.refresh_after_change().await;
                Ok(SubmitOutcome::Accepted(prescription))
            }
            SubmissionOutcome::Failed { message } => Err(Error::Remote { message }),
        }
    }

    /// Reload after a successful change. A failed reload is appended to the
    /// success notice instead of replacing it.
    async fn refresh_after_change(&mut self) {
        let success = self.form.notice.clone();
        let Err(err) = self.load().await else {
            return;
        };
        warn!("Medication refresh after change failed: {}", err);

        if let Some(success) = success {
            let message = format!("{} {}", success.text, err);
            if let Err(apply_err) = self
                .execute(Command::RecordRequestFailure { message })
                .await
            {
                warn!("Could not record request failure: {}", apply_err);
            }
        }
    }

    async fn record_failure(&mut self, err: &Error, fallback: &str) -> Error {
        let message = err.user_message(fallback);
        warn!("{}: {}", fallback, err);
        if let Err(apply_err) = self
            .execute(Command::RecordRequestFailure {
                message: message.clone(),
            })
            .await
        {
            warn!("Could not record request failure: {}", apply_err);
        }
        Error::Remote { message }
    }
}

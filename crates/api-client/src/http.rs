use async_trait::async_trait;
use domain::{
    allergies::Allergy,
    medications::Medication,
    prescriptions::{PrescriptionDraft, PrescriptionResult},
    MedicationId, PatientId, ProviderId, RecordsApi,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config::ClientConfig,
    error::{ClientError, ErrorBody},
};

/// Records API client over HTTP with bearer authentication.
pub struct HttpRecordsApi {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpRecordsApi {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Probe `GET /health`. `Ok(false)` means reachable but unhealthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        Ok(response.status() == reqwest::StatusCode::OK)
    }

    pub async fn fetch_medications(
        &self,
        patient_id: PatientId,
    ) -> Result<Vec<Medication>, ClientError> {
        let path = format!("/patients/{patient_id}/medications");
        let response = self.send(self.request(Method::GET, &path)).await?;
        decode(response).await
    }

    pub async fn post_prescription(
        &self,
        patient_id: PatientId,
        provider_id: ProviderId,
        draft: &PrescriptionDraft,
    ) -> Result<PrescriptionResult, ClientError> {
        let path = format!("/patients/{patient_id}/providers/{provider_id}/prescriptions");
        let response = self
            .send(self.request(Method::POST, &path).json(draft))
            .await?;
        decode(response).await
    }

    pub async fn remove_medication(
        &self,
        patient_id: PatientId,
        medication_id: MedicationId,
    ) -> Result<(), ClientError> {
        let path = format!("/patients/{patient_id}/medications/{medication_id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    pub async fn fetch_allergies(
        &self,
        patient_id: PatientId,
    ) -> Result<Vec<Allergy>, ClientError> {
        let path = format!("/patients/{patient_id}/allergies");
        let response = self.send(self.request(Method::GET, &path)).await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.config.base_url, self.config.path_prefix, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.config.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!("Could not read {} error body: {}", status, err);
                String::new()
            }
        };
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message);
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn classify(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.config.timeout.as_secs())
        } else if err.is_connect() {
            ClientError::Connection(self.config.base_url.clone())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::ResponseParsing(e.to_string()))
}

#[async_trait]
impl RecordsApi for HttpRecordsApi {
    async fn list_medications(
        &self,
        patient_id: PatientId,
    ) -> Result<Vec<Medication>, domain::Error> {
        Ok(self.fetch_medications(patient_id).await?)
    }

    async fn create_prescription(
        &self,
        patient_id: PatientId,
        provider_id: ProviderId,
        draft: &PrescriptionDraft,
    ) -> Result<PrescriptionResult, domain::Error> {
        Ok(self.post_prescription(patient_id, provider_id, draft).await?)
    }

    async fn delete_medication(
        &self,
        patient_id: PatientId,
        medication_id: MedicationId,
    ) -> Result<(), domain::Error> {
        Ok(self.remove_medication(patient_id, medication_id).await?)
    }

    async fn list_allergies(&self, patient_id: PatientId) -> Result<Vec<Allergy>, domain::Error> {
        Ok(self.fetch_allergies(patient_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        sync::{Arc, Mutex},
    };

    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{delete, get, post},
        Json, Router,
    };
    use domain::prescriptions::{DraftField, PrescriptionPanel, SubmitOutcome};
    use serde_json::{json, Value};

    use super::*;

    #[derive(Clone, Default)]
    struct Recorded {
        auth: Arc<Mutex<Vec<Option<String>>>>,
        bodies: Arc<Mutex<Vec<Value>>>,
        medications: Arc<Mutex<Vec<Value>>>,
    }

    fn record_auth(state: &Recorded, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        state.auth.lock().unwrap().push(auth);
    }

    async fn list_medications(
        State(state): State<Recorded>,
        Path(patient_id): Path<i64>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        record_auth(&state, &headers);
        if patient_id == 404 {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Patient not found" })),
            );
        }
        let meds = state.medications.lock().unwrap().clone();
        (StatusCode::OK, Json(Value::Array(meds)))
    }

    async fn create_prescription(
        State(state): State<Recorded>,
        Path((_patient_id, _provider_id)): Path<(i64, i64)>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        record_auth(&state, &headers);
        state.bodies.lock().unwrap().push(body.clone());

        if body["drug_name"] == "Aspirin" && body["override"] == false {
            return Json(json!({
                "conflicts": true,
                "conflict_messages": ["Aspirin interacts with Warfarin", "Patient allergic to NSAIDs"],
                "prescription": null
            }));
        }

        let conflict_details = if body["override"] == true {
            json!("Aspirin interacts with Warfarin")
        } else {
            Value::Null
        };
        let created = json!({
            "id": 77,
            "patient_id": 3,
            "doctor_id": 1,
            "drug_name": body["drug_name"],
            "dose": body["dose"],
            "frequency": body["frequency"],
            "duration": body["duration"],
            "route": body["route"],
            "notes": body["notes"],
            "status": true,
            "is_perscription": true,
            "conflict_flag": body["override"],
            "conflict_details": conflict_details,
            "override_justification": body["override_justification"]
        });
        state.medications.lock().unwrap().push(created.clone());
        Json(json!({ "conflicts": false, "conflict_messages": [], "prescription": created }))
    }

    async fn delete_medication(
        State(state): State<Recorded>,
        Path((_patient_id, medication_id)): Path<(i64, i64)>,
    ) -> impl IntoResponse {
        let mut meds = state.medications.lock().unwrap();
        let before = meds.len();
        meds.retain(|m| m["id"] != medication_id);
        if meds.len() == before {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Medication not found" })),
            )
                .into_response();
        }
        StatusCode::NO_CONTENT.into_response()
    }

    async fn list_allergies() -> impl IntoResponse {
        Json(json!([
            { "id": 1, "patient_id": 3, "substance": "NSAIDs", "reaction": "hives", "severity": "moderate" }
        ]))
    }

    async fn serve(state: Recorded) -> SocketAddr {
        let app = Router::new()
            .route("/health", get(|| async { StatusCode::OK }))
            .route("/default/patients/:patient_id/medications", get(list_medications))
            .route(
                "/default/patients/:patient_id/providers/:provider_id/prescriptions",
                post(create_prescription),
            )
            .route(
                "/default/patients/:patient_id/medications/:medication_id",
                delete(delete_medication),
            )
            .route("/default/patients/:patient_id/allergies", get(list_allergies))
            .route(
                "/broken/patients/:patient_id/medications",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client(addr: SocketAddr) -> HttpRecordsApi {
        let config = ClientConfig::new(format!("http://{addr}"))
            .with_prefix("/default")
            .with_token("token-123");
        HttpRecordsApi::new(config).unwrap()
    }

    fn warfarin() -> Value {
        json!({
            "id": 5, "patient_id": 3, "drug_name": "Warfarin", "dose": "5mg",
            "frequency": "QD", "duration": "30 days", "route": "oral", "notes": null,
            "conflict_flag": false, "conflict_details": null, "is_perscription": true
        })
    }

    #[tokio::test]
    async fn lists_medications_with_bearer_token() {
        let state = Recorded::default();
        state.medications.lock().unwrap().push(warfarin());
        let api = client(serve(state.clone()).await);

        let meds = api.fetch_medications(3).await.unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].drug_name, "Warfarin");
        assert_eq!(meds[0].notes, None);
        assert_eq!(
            state.auth.lock().unwrap().as_slice(),
            &[Some("Bearer token-123".to_string())]
        );
    }

    #[tokio::test]
    async fn error_payload_message_is_used_verbatim() {
        let api = client(serve(Recorded::default()).await);

        let err = api.fetch_medications(404).await.unwrap_err();
        assert!(matches!(
            &err,
            ClientError::Status { status: 404, message: Some(m) } if m == "Patient not found"
        ));

        let err: domain::Error = api.remove_medication(3, 999).await.unwrap_err().into();
        assert_eq!(err.user_message("Failed to delete medication"), "Medication not found");
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_generic_message() {
        let addr = serve(Recorded::default()).await;
        let config = ClientConfig::new(format!("http://{addr}")).with_prefix("broken");
        let api = HttpRecordsApi::new(config).unwrap();

        let err = api.fetch_medications(3).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status {
                status: 500,
                message: None
            }
        ));

        let err: domain::Error = err.into();
        assert_eq!(
            err.user_message("Failed to load medications"),
            "Failed to load medications"
        );
    }

    #[tokio::test]
    async fn conflict_verdict_is_decoded() {
        let state = Recorded::default();
        let api = client(serve(state.clone()).await);

        let draft = PrescriptionDraft {
            drug_name: "Aspirin".to_string(),
            dose: "81mg".to_string(),
            frequency: "QD".to_string(),
            duration: "30 days".to_string(),
            ..Default::default()
        };
        let result = api.post_prescription(3, 1, &draft).await.unwrap();
        assert!(result.conflicts);
        assert_eq!(
            result.conflict_messages,
            vec![
                "Aspirin interacts with Warfarin".to_string(),
                "Patient allergic to NSAIDs".to_string()
            ]
        );
        assert!(result.prescription.is_none());

        let sent = state.bodies.lock().unwrap()[0].clone();
        assert_eq!(sent["is_perscription"], true);
        assert_eq!(sent["status"], true);
        assert_eq!(sent["override"], false);
        assert_eq!(sent["route"], "oral");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(addr);
        let err = api.fetch_medications(3).await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)), "got {err:?}");
        assert!(api.health().await.is_err());
    }

    #[tokio::test]
    async fn health_check_reports_ok() {
        let api = client(serve(Recorded::default()).await);
        assert!(api.health().await.unwrap());
    }

    #[tokio::test]
    async fn allergies_are_listed() {
        let api = client(serve(Recorded::default()).await);
        let allergies = api.fetch_allergies(3).await.unwrap();
        assert_eq!(allergies[0].summary(), "NSAIDs (moderate): hives");
    }

    #[tokio::test]
    async fn panel_runs_conflict_and_override_against_http() {
        let state = Recorded::default();
        state.medications.lock().unwrap().push(warfarin());
        let api = client(serve(state.clone()).await);

        let mut panel = PrescriptionPanel::new(api, 3, 1);
        panel.load().await.unwrap();
        panel.open_form().await.unwrap();
        panel.set_field(DraftField::DrugName, "Aspirin").await.unwrap();
        panel.set_field(DraftField::Dose, "81mg").await.unwrap();
        panel.set_field(DraftField::Frequency, "QD").await.unwrap();
        panel.set_field(DraftField::Duration, "30 days").await.unwrap();

        let outcome = panel.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Conflicts(ref m) if m.len() == 2));
        assert_eq!(panel.form().medications.len(), 1);

        panel
            .set_justification("Cardiology approved low-dose therapy")
            .await
            .unwrap();
        let outcome = panel.submit_override().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted(ref m) if m.id == 77));

        let bodies = state.bodies.lock().unwrap().clone();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[1]["override"], true);
        assert_eq!(
            bodies[1]["override_justification"],
            "Cardiology approved low-dose therapy"
        );

        let view = panel.view();
        assert!(view.form.is_none());
        assert_eq!(view.medications.len(), 2);
        assert_eq!(view.medications[1].conflict, "⚠️ Aspirin interacts with Warfarin");

        panel.delete_medication(77).await.unwrap();
        assert_eq!(panel.form().medications.len(), 1);
    }
}

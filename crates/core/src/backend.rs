//! HTTP client for the portal backend.
//!
//! The lookup pipeline only needs [`PatientBackend`]; [`HttpBackend`] implements it over the
//! REST API and also exposes the reports list and booking endpoints used by the CLI.

use crate::config::PortalConfig;
use crate::constants::{PATIENTS_PATH, PATIENT_REPORTS_PATH};
use crate::models::{
    AppointmentRequest, BookedAppointment, Department, Doctor, Hospital, PatientProfile,
    PatientReport, TimeSlot,
};
use crate::BackendError;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use swastha_types::PatientIdentifier;

/// Source of the two records a lookup needs.
pub trait PatientBackend: Send + Sync {
    /// `GET {base}/patients/{id}`
    fn fetch_profile(
        &self,
        id: &PatientIdentifier,
    ) -> impl Future<Output = Result<PatientProfile, BackendError>> + Send;

    /// `GET {base}/patient-reports/{id}`
    fn fetch_report(
        &self,
        id: &PatientIdentifier,
    ) -> impl Future<Output = Result<PatientReport, BackendError>> + Send;
}

/// Error body produced by the backend for non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// REST client for the portal backend.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    base: Url,
    client: Client,
    timeout: Duration,
}

impl HttpBackend {
    /// Build a client for the configured backend, applying the configured request timeout.
    pub fn new(cfg: &PortalConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self::with_client(cfg, client))
    }

    /// Use a caller-built `reqwest::Client`, e.g. one with proxies disabled.
    pub fn with_client(cfg: &PortalConfig, client: Client) -> Self {
        Self {
            base: cfg.backend_base().clone(),
            client,
            timeout: cfg.request_timeout(),
        }
    }

    /// `GET {base}/patient-reports`
    pub async fn list_reports(&self) -> Result<Vec<PatientReport>, BackendError> {
        self.get_json(self.endpoint([PATIENT_REPORTS_PATH])?).await
    }

    /// `GET {base}/hospitals`
    pub async fn hospitals(&self) -> Result<Vec<Hospital>, BackendError> {
        self.get_json(self.endpoint(["hospitals"])?).await
    }

    /// `GET {base}/departments`
    pub async fn departments(&self) -> Result<Vec<Department>, BackendError> {
        self.get_json(self.endpoint(["departments"])?).await
    }

    /// `GET {base}/doctors?department={department}`
    pub async fn doctors(&self, department: &str) -> Result<Vec<Doctor>, BackendError> {
        let mut url = self.endpoint(["doctors"])?;
        url.query_pairs_mut().append_pair("department", department);
        self.get_json(url).await
    }

    /// `GET {base}/timeslot`
    pub async fn time_slots(&self) -> Result<Vec<TimeSlot>, BackendError> {
        self.get_json(self.endpoint(["timeslot"])?).await
    }

    /// `POST {base}/appointments/book`
    pub async fn book_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> Result<BookedAppointment, BackendError> {
        let url = self.endpoint(["appointments", "book"])?;
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response).await
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint<I>(&self, segments: I) -> Result<Url, BackendError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .filter(|m| !m.trim().is_empty());
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body).map_err(|e| BackendError::MalformedBody(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            err.into()
        }
    }
}

impl PatientBackend for HttpBackend {
    async fn fetch_profile(&self, id: &PatientIdentifier) -> Result<PatientProfile, BackendError> {
        self.get_json(self.endpoint([PATIENTS_PATH, id.as_str()])?)
            .await
    }

    async fn fetch_report(&self, id: &PatientIdentifier) -> Result<PatientReport, BackendError> {
        self.get_json(self.endpoint([PATIENT_REPORTS_PATH, id.as_str()])?)
            .await
    }
}

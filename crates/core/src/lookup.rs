//! Paired profile and report lookup.
//!
//! A lookup fetches the profile, then the report, and publishes both together or a single
//! error. The orchestrator owns the one "currently displayed" slot. Each lookup takes a ticket
//! from a monotonically increasing counter, and a result is only published if its ticket is
//! still the latest when it completes; anything older is dropped, so the slot never shows a
//! superseded patient.

use crate::backend::PatientBackend;
use crate::models::PatientRecord;
use crate::{BackendError, ScanError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use swastha_types::PatientIdentifier;

/// Contents of the display slot.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    Idle,
    Loading { identifier: PatientIdentifier },
    Ready(Arc<PatientRecord>),
    Failed(ScanError),
}

/// What happened to one lookup once it completed.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// This lookup was the latest one and its result is now in the display slot.
    Published(Result<Arc<PatientRecord>, ScanError>),
    /// A newer lookup (or a reset) started before this one finished; the result was dropped.
    Superseded,
}

/// A lookup that has been started with [`LookupOrchestrator::begin`] but not yet completed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a started lookup stays Loading until it is completed"]
pub struct LookupTicket {
    identifier: PatientIdentifier,
    number: u64,
}

impl LookupTicket {
    pub fn identifier(&self) -> &PatientIdentifier {
        &self.identifier
    }
}

pub struct LookupOrchestrator<B> {
    backend: B,
    timeout: Duration,
    latest: AtomicU64,
    slot: Mutex<LookupState>,
}

impl<B: PatientBackend> LookupOrchestrator<B> {
    /// `timeout` bounds the whole lookup; expiry is reported as a failed lookup.
    pub fn new(backend: B, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            latest: AtomicU64::new(0),
            slot: Mutex::new(LookupState::Idle),
        }
    }

    /// The backend lookups are fetched from.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Snapshot of the display slot.
    pub fn state(&self) -> LookupState {
        self.slot().clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.slot(), LookupState::Loading { .. })
    }

    /// Empty the display slot and drop the result of any lookup still in flight.
    pub fn reset(&self) {
        let mut slot = self.slot();
        self.latest.fetch_add(1, Ordering::SeqCst);
        *slot = LookupState::Idle;
    }

    /// Fetch the profile and report for `identifier` and publish them as one unit.
    ///
    /// Shorthand for [`begin`](Self::begin) followed by [`complete`](Self::complete).
    pub async fn lookup(&self, identifier: PatientIdentifier) -> LookupOutcome {
        let ticket = self.begin(identifier);
        self.complete(ticket).await
    }

    /// Start a lookup: the slot shows `Loading` for `identifier` as soon as this returns, and
    /// every earlier lookup is superseded.
    ///
    /// # Arguments
    /// * `identifier` - Patient whose profile and report will be fetched
    ///
    /// # Returns
    /// The ticket to pass to [`complete`](Self::complete).
    pub fn begin(&self, identifier: PatientIdentifier) -> LookupTicket {
        let mut slot = self.slot();
        let number = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        *slot = LookupState::Loading {
            identifier: identifier.clone(),
        };
        tracing::info!(patient = %identifier, ticket = number, "lookup started");
        LookupTicket { identifier, number }
    }

    /// Run the fetches for a started lookup and publish the result if it is still the latest.
    pub async fn complete(&self, ticket: LookupTicket) -> LookupOutcome {
        let LookupTicket { identifier, number } = ticket;

        let fetched = match tokio::time::timeout(self.timeout, self.fetch_pair(&identifier)).await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        };

        let result = fetched.map(Arc::new).map_err(|e| {
            tracing::warn!(patient = %identifier, error = %e, "lookup failed");
            ScanError::lookup_failed(&e)
        });

        let mut slot = self.slot();
        if self.latest.load(Ordering::SeqCst) != number {
            tracing::debug!(patient = %identifier, ticket = number, "discarding superseded lookup");
            return LookupOutcome::Superseded;
        }

        *slot = match &result {
            Ok(record) => LookupState::Ready(Arc::clone(record)),
            Err(e) => LookupState::Failed(e.clone()),
        };
        LookupOutcome::Published(result)
    }

    async fn fetch_pair(&self, identifier: &PatientIdentifier) -> Result<PatientRecord, BackendError> {
        let profile = self.backend.fetch_profile(identifier).await?;
        let report = self.backend.fetch_report(identifier).await?;
        Ok(PatientRecord { profile, report })
    }

    fn slot(&self) -> MutexGuard<'_, LookupState> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! The doctor-side scan flow: scanner, lookup, and navigation driven as one state machine.
//!
//! [`ScanSession`] owns the scanner and the doctor navigator and shares the orchestrator. A
//! single [`ScanPhase`] records where the flow is, so capturing and presenting can never be
//! active together. A decode stops the scanner before its lookup starts, and no further decode
//! is taken until that lookup has finished.
//!
//! Handling a decode is split in two so a caller can keep serving other input while the
//! lookup runs: [`ScanSession::accept_event`] enters `Loading` and hands back a
//! [`LookupTicket`], the future from [`ScanSession::pending_lookup`] does the fetching without
//! borrowing the session, and [`ScanSession::finish_lookup`] applies the outcome.

use crate::backend::PatientBackend;
use crate::lookup::{LookupOrchestrator, LookupOutcome, LookupState, LookupTicket};
use crate::navigator::{DoctorView, Navigator};
use crate::payload::resolve_identifier;
use crate::scanner::{Camera, QrDecoder, ScanEvent, Scanner};
use crate::ScanError;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Scanner closed, nothing loading.
    Idle,
    Capturing,
    Loading,
    /// A record is on the report view.
    Presenting,
}

pub struct ScanSession<B, C, D> {
    scanner: Scanner<C, D>,
    navigator: Navigator<DoctorView>,
    orchestrator: Arc<LookupOrchestrator<B>>,
    phase: ScanPhase,
}

impl<B, C, D> ScanSession<B, C, D>
where
    B: PatientBackend,
    C: Camera,
    D: QrDecoder<Frame = C::Frame>,
{
    pub fn new(scanner: Scanner<C, D>, orchestrator: Arc<LookupOrchestrator<B>>) -> Self {
        Self {
            scanner,
            navigator: Navigator::new(),
            orchestrator,
            phase: ScanPhase::Idle,
        }
    }

    /// Where the flow currently is.
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// The doctor view being shown.
    pub fn view(&self) -> DoctorView {
        self.navigator.current()
    }

    /// Message shown on the current view, if any. Cleared by the next navigation.
    pub fn notice(&self) -> Option<&str> {
        self.navigator.notice()
    }

    pub fn lookup_state(&self) -> LookupState {
        self.orchestrator.state()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanner.is_running()
    }

    /// Start a fresh scan: clear the previous result and notice, show the scanner view, and
    /// open the camera.
    pub fn open_scanner(&mut self) -> Result<(), ScanError> {
        self.orchestrator.reset();
        self.navigator.navigate(DoctorView::ScanQr);

        match self.scanner.start() {
            Ok(()) => {
                self.phase = ScanPhase::Capturing;
                Ok(())
            }
            Err(e) => {
                self.phase = ScanPhase::Idle;
                self.navigator.attach_notice(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn close_scanner(&mut self) {
        self.scanner.stop().await;
        if self.phase == ScanPhase::Capturing {
            self.phase = ScanPhase::Idle;
        }
    }

    /// Explicit navigation. Leaving the scan and report views closes the scanner and drops
    /// the displayed record.
    pub async fn navigate(&mut self, view: DoctorView) {
        if !matches!(view, DoctorView::ScanQr | DoctorView::PatientReport) {
            self.scanner.stop().await;
            self.orchestrator.reset();
            self.phase = ScanPhase::Idle;
        }
        self.navigator.navigate(view);
    }

    /// Wait for the next scanner event. Never resolves while the scanner is stopped.
    pub async fn next_event(&mut self) -> ScanEvent {
        if let Some(event) = self.scanner.next_event().await {
            return event;
        }
        // The capture task has ended; take the camera back so it can be reopened.
        self.close_scanner().await;
        std::future::pending().await
    }

    /// Apply a scanner event and run any lookup it starts to completion.
    pub async fn handle_event(&mut self, event: ScanEvent) {
        if let Some(ticket) = self.accept_event(event).await {
            let outcome = self.orchestrator.complete(ticket).await;
            self.finish_lookup(outcome);
        }
    }

    /// Apply a scanner event without waiting for the backend.
    ///
    /// A decode that resolves to a patient stops the scanner, switches to the report view in
    /// `Loading`, and starts the lookup.
    ///
    /// # Returns
    /// The started lookup, to be run with [`pending_lookup`](Self::pending_lookup) and applied
    /// with [`finish_lookup`](Self::finish_lookup). `None` for every other event.
    pub async fn accept_event(&mut self, event: ScanEvent) -> Option<LookupTicket> {
        match event {
            ScanEvent::Decoded(payload) => self.accept_decode(payload).await,
            ScanEvent::DecoderError(message) => {
                tracing::warn!(%message, "scanner error");
                self.navigator.attach_notice(message);
                None
            }
            ScanEvent::CameraFailed(message) => {
                self.scanner.stop().await;
                self.phase = ScanPhase::Idle;
                self.navigator
                    .attach_notice(ScanError::CameraUnavailable(message).to_string());
                None
            }
        }
    }

    /// The fetches for a started lookup, detached from the session so commands can still be
    /// applied while it runs.
    pub fn pending_lookup(
        &self,
        ticket: LookupTicket,
    ) -> impl Future<Output = LookupOutcome> + Send + 'static
    where
        B: 'static,
    {
        let orchestrator = Arc::clone(&self.orchestrator);
        async move { orchestrator.complete(ticket).await }
    }

    /// Apply the outcome of the lookup started by [`accept_event`](Self::accept_event).
    ///
    /// Ignored if the session has left `Loading` since, e.g. the scanner was reopened.
    pub fn finish_lookup(&mut self, outcome: LookupOutcome) {
        if self.phase != ScanPhase::Loading {
            tracing::debug!(phase = ?self.phase, "lookup finished after the session moved on");
            return;
        }

        match outcome {
            LookupOutcome::Published(Ok(record)) => {
                tracing::info!(patient = %record.profile.name, "presenting report");
                self.phase = ScanPhase::Presenting;
                self.navigator.lookup_succeeded();
            }
            LookupOutcome::Published(Err(e)) => {
                self.phase = ScanPhase::Idle;
                self.navigator.lookup_failed(e.to_string());
            }
            LookupOutcome::Superseded => {
                tracing::debug!("lookup superseded before it completed");
                self.phase = ScanPhase::Idle;
            }
        }
        self.scanner.gate().release();
    }

    async fn accept_decode(&mut self, payload: String) -> Option<LookupTicket> {
        if self.phase != ScanPhase::Capturing {
            tracing::debug!(phase = ?self.phase, "ignoring decode outside capture");
            return None;
        }
        self.scanner.stop().await;

        let identifier = match resolve_identifier(&payload) {
            Ok(identifier) => identifier,
            Err(e) => {
                tracing::warn!(error = %e, "unusable QR payload");
                self.phase = ScanPhase::Idle;
                self.navigator.lookup_failed(e.to_string());
                return None;
            }
        };

        self.phase = ScanPhase::Loading;
        self.navigator.lookup_started();
        Some(self.orchestrator.begin(identifier))
    }
}

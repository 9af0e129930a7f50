//! QR scanner capture.
//!
//! A [`Scanner`] owns a [`Camera`] and a [`QrDecoder`]. While started, a background task
//! captures one frame per interval, decodes it, and reports [`ScanEvent`]s over a channel.
//! Frames without a code are the steady state and produce no event. Capture and decode are
//! synchronous and may be slow, so each frame is read on the blocking pool.
//!
//! The [`DecodeGate`] keeps a code held in front of the camera from flooding the caller: once
//! a payload has been reported, every decode is suppressed until the caller releases the
//! gate, and the same payload stays suppressed until a frame without it has been seen.

mod image_dir;
mod rqrr_decoder;
mod wedge;

pub use image_dir::{GrayFrame, ImageDirCamera};
pub use rqrr_decoder::RqrrDecoder;
pub use wedge::{TextDecoder, WedgeCamera};

use crate::{CameraError, DecodeError, ScanError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Which camera to prefer when a device has several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Rear-facing, pointed at the patient's card.
    Environment,
    User,
}

/// A source of frames. Owned exclusively by one [`Scanner`].
pub trait Camera: Send + 'static {
    type Frame: Send + 'static;

    fn open(&mut self, facing: Facing) -> Result<(), CameraError>;

    /// Capture the current frame, or `None` if the source has nothing new this tick.
    fn capture(&mut self) -> Result<Option<Self::Frame>, CameraError>;

    fn release(&mut self);
}

pub trait QrDecoder: Send + Sync + 'static {
    type Frame;

    fn decode(&self, frame: &Self::Frame) -> Result<String, DecodeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A payload admitted by the gate.
    Decoded(String),
    /// The decoder failed on a frame that contained something code-like. Capture continues.
    DecoderError(String),
    /// The camera stopped delivering frames. Capture has ended.
    CameraFailed(String),
}

#[derive(Debug, Default)]
struct GateState {
    processing: bool,
    last_emitted: Option<String>,
    held_in_view: bool,
}

/// Duplicate-decode suppression shared between the capture task and its consumer.
#[derive(Debug, Clone, Default)]
pub struct DecodeGate {
    state: Arc<Mutex<GateState>>,
}

impl DecodeGate {
    /// Decide whether a decoded payload should be reported. Admitting closes the gate.
    pub fn admit(&self, payload: &str) -> bool {
        let mut state = self.lock();
        let held = state.last_emitted.as_deref() == Some(payload);
        if !held {
            state.held_in_view = false;
        }
        if state.processing || (held && state.held_in_view) {
            return false;
        }
        state.processing = true;
        state.last_emitted = Some(payload.to_string());
        state.held_in_view = true;
        true
    }

    /// Record a frame in which no code was visible.
    pub fn frame_without_code(&self) {
        self.lock().held_in_view = false;
    }

    /// The consumer finished with the last admitted payload.
    pub fn release(&self) {
        self.lock().processing = false;
    }

    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    pub fn reset(&self) {
        *self.lock() = GateState::default();
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Running<C> {
    stop: oneshot::Sender<()>,
    /// Hands the camera back, or `None` if it was lost with a panicking frame read.
    task: JoinHandle<Option<C>>,
    events: mpsc::UnboundedReceiver<ScanEvent>,
}

pub struct Scanner<C, D> {
    camera: Option<C>,
    decoder: Arc<D>,
    interval: Duration,
    gate: DecodeGate,
    running: Option<Running<C>>,
}

impl<C, D> Scanner<C, D>
where
    C: Camera,
    D: QrDecoder<Frame = C::Frame>,
{
    /// Create a stopped scanner.
    ///
    /// # Arguments
    /// * `camera` - Frame source, opened on [`start`](Self::start)
    /// * `decoder` - Decoder applied to every captured frame
    /// * `interval` - Time between frame captures
    pub fn new(camera: C, decoder: D, interval: Duration) -> Self {
        Self {
            camera: Some(camera),
            decoder: Arc::new(decoder),
            interval,
            gate: DecodeGate::default(),
            running: None,
        }
    }

    /// Duplicate suppression for this scanner. Release it once a decoded payload is handled.
    pub fn gate(&self) -> &DecodeGate {
        &self.gate
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Open the camera (rear-facing preferred) and start polling frames.
    ///
    /// Starting an already running scanner does nothing. A camera that cannot be opened is
    /// reported as [`ScanError::CameraUnavailable`] and is not retried.
    pub fn start(&mut self) -> Result<(), ScanError> {
        if self.running.is_some() {
            return Ok(());
        }

        let mut camera = self
            .camera
            .take()
            .ok_or_else(|| ScanError::CameraUnavailable("camera handle was lost".into()))?;

        if let Err(e) = camera.open(Facing::Environment) {
            tracing::warn!(error = %e, "camera unavailable");
            self.camera = Some(camera);
            return Err(ScanError::CameraUnavailable(e.to_string()));
        }

        self.gate.reset();
        let (stop_tx, stop_rx) = oneshot::channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(poll_frames(
            camera,
            Arc::clone(&self.decoder),
            self.interval,
            self.gate.clone(),
            event_tx,
            stop_rx,
        ));

        tracing::info!(interval = ?self.interval, "scanner started");
        self.running = Some(Running {
            stop: stop_tx,
            task,
            events: event_rx,
        });
        Ok(())
    }

    /// Stop polling and release the camera. Stopping a stopped scanner does nothing.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        // The task may already have exited after a camera failure.
        let _ = running.stop.send(());
        match running.task.await {
            Ok(Some(camera)) => self.camera = Some(camera),
            Ok(None) => tracing::error!("camera was lost while reading a frame"),
            Err(e) => tracing::error!(error = %e, "scanner task did not return the camera"),
        }
        tracing::info!("scanner stopped");
    }

    /// Next event from the capture task. `None` when stopped or once the task has ended.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        let running = self.running.as_mut()?;
        running.events.recv().await
    }
}

/// What one capture-and-decode attempt produced.
enum FrameRead {
    Empty,
    Decoded(Result<String, DecodeError>),
    Failed(CameraError),
}

fn read_frame<C, D>(camera: &mut C, decoder: &D) -> FrameRead
where
    C: Camera,
    D: QrDecoder<Frame = C::Frame>,
{
    match camera.capture() {
        Ok(Some(frame)) => FrameRead::Decoded(decoder.decode(&frame)),
        Ok(None) => FrameRead::Empty,
        Err(e) => FrameRead::Failed(e),
    }
}

async fn poll_frames<C, D>(
    mut camera: C,
    decoder: Arc<D>,
    period: Duration,
    gate: DecodeGate,
    events: mpsc::UnboundedSender<ScanEvent>,
    mut stop: oneshot::Receiver<()>,
) -> Option<C>
where
    C: Camera,
    D: QrDecoder<Frame = C::Frame>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_error: Option<String> = None;

    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {}
        }

        let worker = Arc::clone(&decoder);
        let read = tokio::task::spawn_blocking(move || {
            let read = read_frame(&mut camera, worker.as_ref());
            (camera, read)
        })
        .await;
        let read = match read {
            Ok((returned, read)) => {
                camera = returned;
                read
            }
            Err(e) => {
                tracing::error!(error = %e, "frame read panicked");
                let _ = events.send(ScanEvent::CameraFailed(e.to_string()));
                return None;
            }
        };

        let event = match read {
            FrameRead::Empty | FrameRead::Decoded(Err(DecodeError::NotFound)) => {
                gate.frame_without_code();
                continue;
            }
            FrameRead::Failed(e) => {
                tracing::warn!(error = %e, "camera stopped delivering frames");
                let _ = events.send(ScanEvent::CameraFailed(e.to_string()));
                break;
            }
            FrameRead::Decoded(Ok(payload)) => {
                last_error = None;
                if !gate.admit(&payload) {
                    tracing::debug!("suppressed repeated decode");
                    continue;
                }
                ScanEvent::Decoded(payload)
            }
            FrameRead::Decoded(Err(DecodeError::Engine(message))) => {
                if last_error.as_deref() == Some(message.as_str()) {
                    continue;
                }
                last_error = Some(message.clone());
                ScanEvent::DecoderError(message)
            }
        };

        if events.send(event).is_err() {
            break;
        }
    }

    camera.release();
    Some(camera)
}

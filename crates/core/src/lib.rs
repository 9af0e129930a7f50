//! # Swastha Core
//!
//! The patient lookup pipeline behind the portal's QR scanner:
//! - Scanner capture with duplicate-decode suppression
//! - Payload interpretation into a validated patient identifier
//! - Paired profile and report lookup against the portal backend
//! - View navigation and plain-text report presentation
//!
//! **No process concerns**: reading the environment, installing logging, and talking to a
//! terminal belong in the binaries. Everything here takes its configuration as values.

pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod lookup;
pub mod models;
pub mod navigator;
pub mod payload;
pub mod report;
pub mod scanner;
pub mod session;

pub use backend::{HttpBackend, PatientBackend};
pub use config::PortalConfig;
pub use error::{BackendError, CameraError, ConfigError, DecodeError, ScanError};
pub use lookup::{LookupOrchestrator, LookupOutcome, LookupState, LookupTicket};
pub use navigator::{DoctorView, Navigator, PatientView, ViewSet};
pub use payload::resolve_identifier;
pub use session::{ScanPhase, ScanSession};
pub use swastha_types::PatientIdentifier;

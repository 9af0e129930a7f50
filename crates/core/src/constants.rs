//! Constants used throughout the Swastha core crate.
//!
//! Environment variable names, defaults, and the fixed QR test fixture live here so the
//! binaries and the library agree on them.

use std::time::Duration;

/// Environment variable holding the backend base URL.
pub const BACKEND_URL_ENV: &str = "SWASTHA_BACKEND_URL";

/// Environment variable holding the per-lookup timeout in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "SWASTHA_REQUEST_TIMEOUT_SECS";

/// Environment variable holding the frame polling interval in milliseconds.
pub const SCAN_INTERVAL_ENV: &str = "SWASTHA_SCAN_INTERVAL_MS";

/// Environment variable holding the generative-AI API key used by the chat assistant.
pub const AI_API_KEY_ENV: &str = "SWASTHA_AI_API_KEY";

/// Timeout applied to a whole lookup (profile and report) when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Interval between decoded frames when none is configured.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(500);

/// Fixed test token printed on the demo patient card.
pub const SENTINEL_PAYLOAD: &str = "user_30PPJDp4cUoAH1sXoYTCdaSpyWM";

/// Identifier the test token resolves to.
pub const SENTINEL_PATIENT_ID: &str = "1";

/// Field names accepted as the patient identifier in a structured payload, in priority order.
pub const IDENTIFIER_FIELDS: [&str; 2] = ["patientId", "id"];

/// Message shown when a lookup fails without a backend-provided explanation.
pub const LOOKUP_FALLBACK_MESSAGE: &str = "Failed to fetch patient data";

/// Backend path segment for patient profiles.
pub const PATIENTS_PATH: &str = "patients";

/// Backend path segment for patient reports.
pub const PATIENT_REPORTS_PATH: &str = "patient-reports";

/// Category assigned to reports the backend did not categorise.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Summary shown for reports without notes.
pub const NO_SUMMARY: &str = "No summary available.";

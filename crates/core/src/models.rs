//! Records returned by the portal backend.
//!
//! Field names follow the backend's camelCase JSON. Only the fields the portal renders are
//! modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A backend record id, which is numeric for stored rows and textual for imported ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A vital sign reading. Blood pressure arrives as text ("120/80"), the rest usually as numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VitalValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for VitalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalValue::Number(n) if n.fract() == 0.0 => write!(f, "{n:.0}"),
            VitalValue::Number(n) => write!(f, "{n}"),
            VitalValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, alias = "phone")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Completed,
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Completed => "completed",
            ReportStatus::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientReport {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, alias = "reportType")]
    pub report_title: String,
    #[serde(default, alias = "uploadedDate")]
    pub report_date: Option<String>,
    #[serde(default, alias = "uploadedBy")]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub blood_pressure: Option<VitalValue>,
    #[serde(default)]
    pub heart_rate: Option<VitalValue>,
    #[serde(default)]
    pub temperature: Option<VitalValue>,
    #[serde(default)]
    pub weight: Option<VitalValue>,
    #[serde(default)]
    pub height: Option<VitalValue>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub follow_up: Option<String>,
    #[serde(default, alias = "reportUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "cloudinaryPublicId")]
    pub public_id: Option<String>,
}

impl PatientReport {
    /// True when at least one vital sign is recorded.
    pub fn has_vitals(&self) -> bool {
        self.vitals().iter().any(|(_, value, _)| value.is_some())
    }

    /// Vital signs with their display label and unit, in display order.
    pub fn vitals(&self) -> [(&'static str, Option<&VitalValue>, &'static str); 5] {
        [
            ("Blood Pressure", self.blood_pressure.as_ref(), ""),
            ("Heart Rate", self.heart_rate.as_ref(), " bpm"),
            ("Temperature", self.temperature.as_ref(), "°F"),
            ("Weight", self.weight.as_ref(), " kg"),
            ("Height", self.height.as_ref(), " cm"),
        ]
    }
}

/// A profile and its report, fetched and published together.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub profile: PatientProfile,
    pub report: PatientReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
}

/// A bookable slot, e.g. `{ "value": "09:00", "time": "09:00 AM" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub value: String,
    pub time: String,
}

/// Body of `POST /appointments/book`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub full_name: String,
    pub age: u32,
    pub phone_number: String,
    pub gender: String,
    pub selected_hospital: String,
    pub selected_department: String,
    pub selected_doctor: String,
    pub selected_date: String,
    pub selected_time: String,
    pub reason_for_appointment: String,
}

/// Appointment returned by the backend after a successful booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedAppointment {
    pub id: RecordId,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_accepts_backend_phone_alias() {
        let profile: PatientProfile = serde_json::from_str(
            r#"{"id": 55, "name": "Sita Sharma", "age": 32, "gender": "Female", "phone": "+977-98-7654321"}"#,
        )
        .unwrap();
        assert_eq!(profile.id, Some(RecordId::Number(55)));
        assert_eq!(profile.phone_number.as_deref(), Some("+977-98-7654321"));
        assert_eq!(profile.address, None);
    }

    #[test]
    fn unknown_report_status_is_other() {
        let report: PatientReport =
            serde_json::from_str(r#"{"reportTitle": "X-Ray", "status": "archived"}"#).unwrap();
        assert_eq!(report.status, ReportStatus::Other);

        let report: PatientReport = serde_json::from_str(r#"{"reportTitle": "X-Ray"}"#).unwrap();
        assert_eq!(report.status, ReportStatus::Other);

        let report: PatientReport =
            serde_json::from_str(r#"{"reportTitle": "X-Ray", "status": "pending"}"#).unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
    }

    #[test]
    fn vitals_accept_numbers_and_text() {
        let report: PatientReport = serde_json::from_str(
            r#"{"reportTitle": "Checkup", "bloodPressure": "120/80", "heartRate": 72, "temperature": 98.6}"#,
        )
        .unwrap();
        assert!(report.has_vitals());
        assert_eq!(report.blood_pressure.as_ref().unwrap().to_string(), "120/80");
        assert_eq!(report.heart_rate.as_ref().unwrap().to_string(), "72");
        assert_eq!(report.temperature.as_ref().unwrap().to_string(), "98.6");
    }

    #[test]
    fn report_accepts_stored_entity_field_names() {
        let report: PatientReport = serde_json::from_str(
            r#"{"id": 1, "reportType": "Blood Test", "reportUrl": "https://cdn.example.org/r/1.pdf",
                "cloudinaryPublicId": "abc", "uploadedBy": "Dr A", "uploadedDate": "2025-07-30"}"#,
        )
        .unwrap();
        assert_eq!(report.id, Some(RecordId::Number(1)));
        assert_eq!(report.report_title, "Blood Test");
        assert_eq!(report.doctor_name.as_deref(), Some("Dr A"));
        assert_eq!(report.report_date.as_deref(), Some("2025-07-30"));
        assert_eq!(report.image_url.as_deref(), Some("https://cdn.example.org/r/1.pdf"));
        assert_eq!(report.public_id.as_deref(), Some("abc"));
        assert_eq!(report.status, ReportStatus::Other);
    }

    #[test]
    fn missing_title_and_name_are_empty() {
        let report: PatientReport = serde_json::from_str(r#"{"id": 4}"#).unwrap();
        assert!(report.report_title.is_empty());

        let profile: PatientProfile = serde_json::from_str(r#"{"id": 4, "age": 30}"#).unwrap();
        assert!(profile.name.is_empty());
        assert_eq!(profile.age, Some(30));
    }

    #[test]
    fn report_without_vitals() {
        let report: PatientReport =
            serde_json::from_str(r#"{"reportTitle": "Consultation", "notes": "Rest"}"#).unwrap();
        assert!(!report.has_vitals());
    }

    #[test]
    fn appointment_request_uses_camel_case() {
        let req = AppointmentRequest {
            full_name: "Hari Bahadur".into(),
            age: 28,
            phone_number: "+977-98-1111222".into(),
            gender: "Male".into(),
            selected_hospital: "1".into(),
            selected_department: "Cardiology".into(),
            selected_doctor: "3".into(),
            selected_date: "2025-07-31".into(),
            selected_time: "09:00".into(),
            reason_for_appointment: "Vaccination consultation".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["fullName"], "Hari Bahadur");
        assert_eq!(json["reasonForAppointment"], "Vaccination consultation");
        assert_eq!(json["selectedDate"], "2025-07-31");
    }
}

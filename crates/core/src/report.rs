//! Plain-text report presentation and the reports list.

use crate::constants::{LOOKUP_FALLBACK_MESSAGE, NO_SUMMARY, UNCATEGORIZED};
use crate::lookup::LookupState;
use crate::models::{PatientRecord, PatientReport, RecordId, ReportStatus};
use crate::ScanError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

const RETRY_HINT: &str = "Open the scanner to try again.";
const EMPTY_GUIDANCE: &str = "No patient selected. Scan a patient QR code to view their report.";

/// The report view in one of its mutually exclusive render states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportPanel<'a> {
    Loading,
    Error(&'a str),
    Populated(&'a PatientRecord),
    Empty,
}

impl<'a> ReportPanel<'a> {
    pub fn from_state(state: &'a LookupState) -> Self {
        match state {
            LookupState::Idle => ReportPanel::Empty,
            LookupState::Loading { .. } => ReportPanel::Loading,
            LookupState::Ready(record) => ReportPanel::Populated(record),
            LookupState::Failed(ScanError::LookupFailed(message)) => ReportPanel::Error(message),
            LookupState::Failed(_) => ReportPanel::Error(LOOKUP_FALLBACK_MESSAGE),
        }
    }
}

impl fmt::Display for ReportPanel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportPanel::Loading => writeln!(f, "Loading patient data..."),
            ReportPanel::Error(message) => {
                writeln!(f, "Error: {message}")?;
                writeln!(f, "{RETRY_HINT}")
            }
            ReportPanel::Populated(record) => write_record(f, record),
            ReportPanel::Empty => writeln!(f, "{EMPTY_GUIDANCE}"),
        }
    }
}

fn write_record(f: &mut fmt::Formatter<'_>, record: &PatientRecord) -> fmt::Result {
    let PatientRecord { profile, report } = record;

    if let Some(title) = present(&report.report_title) {
        writeln!(f, "{title}")?;
    }
    if let Some(date) = &report.report_date {
        writeln!(f, "Date: {}", format_report_date(date))?;
    }
    if let Some(doctor) = &report.doctor_name {
        writeln!(f, "Doctor: {doctor}")?;
    }
    writeln!(f, "Status: {}", report.status)?;

    writeln!(f)?;
    writeln!(f, "Patient")?;
    if let Some(name) = present(&profile.name) {
        writeln!(f, "  Name: {name}")?;
    }
    if let Some(age) = profile.age {
        writeln!(f, "  Age: {age}")?;
    }
    let contact = [
        ("Gender", &profile.gender),
        ("Phone", &profile.phone_number),
        ("Email", &profile.email),
        ("Address", &profile.address),
    ];
    for (label, value) in contact {
        if let Some(value) = value {
            writeln!(f, "  {label}: {value}")?;
        }
    }

    if report.has_vitals() {
        writeln!(f)?;
        writeln!(f, "Vitals")?;
        for (label, value, unit) in report.vitals() {
            if let Some(value) = value {
                writeln!(f, "  {label}: {value}{unit}")?;
            }
        }
    }

    for (heading, text) in [("Notes", &report.notes), ("Follow-up", &report.follow_up)] {
        if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
            writeln!(f)?;
            writeln!(f, "{heading}")?;
            writeln!(f, "  {text}")?;
        }
    }

    if let Some(url) = &report.image_url {
        writeln!(f)?;
        writeln!(f, "Image: {url}")?;
    }
    if let Some(category) = &report.category {
        writeln!(f, "Category: {category}")?;
    }
    if let Some(id) = &report.id {
        writeln!(f, "Report ID: {id}")?;
    }
    Ok(())
}

fn present(text: &str) -> Option<&str> {
    Some(text.trim()).filter(|t| !t.is_empty())
}

/// Render a backend date as `YYYY-MM-DD`, or verbatim if it is not a recognisable date.
pub fn format_report_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.date().format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

/// Lowercase with whitespace removed; absent or blank becomes `uncategorized`.
pub fn normalise_category(category: Option<&str>) -> String {
    let normalised: String = category
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    if normalised.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        normalised
    }
}

/// One row of the reports list.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub id: Option<RecordId>,
    pub title: String,
    pub date: Option<String>,
    pub doctor: Option<String>,
    pub status: ReportStatus,
    pub category: String,
    pub summary: String,
}

impl From<&PatientReport> for ReportSummary {
    fn from(report: &PatientReport) -> Self {
        Self {
            id: report.id.clone(),
            title: report.report_title.clone(),
            date: report.report_date.as_deref().map(format_report_date),
            doctor: report.doctor_name.clone(),
            status: report.status,
            category: normalise_category(report.category.as_deref()),
            summary: report
                .notes
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| NO_SUMMARY.to_string()),
        }
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.title)?;
        if let Some(date) = &self.date {
            write!(f, " ({date})")?;
        }
        if let Some(doctor) = &self.doctor {
            write!(f, " - {doctor}")?;
        }
        write!(f, " [{}]\n    {}", self.status, self.summary)
    }
}

/// Summaries in `category`; `all` keeps everything.
pub fn filter_by_category<'a>(
    summaries: &'a [ReportSummary],
    category: &str,
) -> Vec<&'a ReportSummary> {
    let wanted = normalise_category(Some(category));
    summaries
        .iter()
        .filter(|s| wanted == "all" || s.category == wanted)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::tests::{profile, report};
    use crate::models::VitalValue;
    use std::sync::Arc;

    fn record() -> PatientRecord {
        let mut profile = profile("Rajesh Kumar");
        profile.gender = Some("Male".into());
        profile.phone_number = Some("+977-98-1234567".into());

        let mut report = report("Blood Test");
        report.report_date = Some("2025-07-30T10:15:00Z".into());
        report.doctor_name = Some("Dr. Anjali Singh".into());
        report.status = ReportStatus::Completed;
        report.heart_rate = Some(VitalValue::Number(72.0));
        report.notes = Some("All values within normal range".into());
        report.id = Some(RecordId::Number(1));
        PatientRecord { profile, report }
    }

    #[test]
    fn populated_panel_shows_present_fields_only() {
        let record = record();
        let text = ReportPanel::Populated(&record).to_string();

        assert!(text.starts_with("Blood Test\n"));
        assert!(text.contains("Date: 2025-07-30\n"));
        assert!(text.contains("Status: completed\n"));
        assert!(text.contains("  Name: Rajesh Kumar\n"));
        assert!(text.contains("  Age: 40\n"));
        assert!(text.contains("  Heart Rate: 72 bpm\n"));
        assert!(!text.contains("Blood Pressure"));
        assert!(text.contains("Notes\n  All values within normal range\n"));
        assert!(!text.contains("Follow-up"));
        assert!(!text.contains("Image:"));
        assert!(text.contains("Report ID: 1\n"));
    }

    #[test]
    fn untitled_report_from_stored_entity_renders() {
        let mut record = record();
        record.profile.name.clear();
        record.report = serde_json::from_str(
            r#"{"id": 1, "reportType": "", "uploadedBy": "Dr A", "uploadedDate": "2025-07-30"}"#,
        )
        .unwrap();

        let text = ReportPanel::Populated(&record).to_string();
        assert!(text.starts_with("Date: 2025-07-30\n"));
        assert!(text.contains("Doctor: Dr A\n"));
        assert!(!text.contains("Name:"));
    }

    #[test]
    fn vitals_block_hidden_without_vitals() {
        let mut record = record();
        record.report.heart_rate = None;
        let text = ReportPanel::Populated(&record).to_string();
        assert!(!text.contains("Vitals"));
    }

    #[test]
    fn panel_follows_lookup_state() {
        assert_eq!(
            ReportPanel::from_state(&LookupState::Idle).to_string(),
            format!("{EMPTY_GUIDANCE}\n")
        );

        let failed = LookupState::Failed(ScanError::LookupFailed("Patient not found".into()));
        let text = ReportPanel::from_state(&failed).to_string();
        assert_eq!(text, format!("Error: Patient not found\n{RETRY_HINT}\n"));

        let ready = LookupState::Ready(Arc::new(record()));
        assert!(matches!(
            ReportPanel::from_state(&ready),
            ReportPanel::Populated(_)
        ));
    }

    #[test]
    fn dates_render_as_calendar_days() {
        assert_eq!(format_report_date("2025-07-30"), "2025-07-30");
        assert_eq!(format_report_date("2025-07-30T23:10:00+05:45"), "2025-07-30");
        assert_eq!(format_report_date("2025-07-30T08:00:00.123"), "2025-07-30");
        assert_eq!(format_report_date("last Tuesday"), "last Tuesday");
    }

    #[test]
    fn categories_are_normalised() {
        assert_eq!(normalise_category(Some("Blood Test")), "bloodtest");
        assert_eq!(normalise_category(Some("  ")), UNCATEGORIZED);
        assert_eq!(normalise_category(None), UNCATEGORIZED);
    }

    #[test]
    fn summary_falls_back_without_notes() {
        let mut r = report("X-Ray");
        r.category = Some("Radiology".into());
        let summary = ReportSummary::from(&r);
        assert_eq!(summary.category, "radiology");
        assert_eq!(summary.summary, NO_SUMMARY);
    }

    #[test]
    fn filter_by_category_or_all() {
        let mut blood = report("Blood Test");
        blood.category = Some("Blood Test".into());
        let xray = report("X-Ray");
        let summaries: Vec<ReportSummary> =
            [&blood, &xray].into_iter().map(ReportSummary::from).collect();

        assert_eq!(filter_by_category(&summaries, "all").len(), 2);
        let only_blood = filter_by_category(&summaries, "blood test");
        assert_eq!(only_blood.len(), 1);
        assert_eq!(only_blood[0].title, "Blood Test");
        assert_eq!(filter_by_category(&summaries, "uncategorized")[0].title, "X-Ray");
    }
}

//! Named views and the navigator that moves between them.
//!
//! No transition is forbidden. The only routing rules are the lookup signals on the doctor
//! side: success opens the report view, failure returns to the scanner with a notice.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view: {0:?}")]
pub struct UnknownView(pub String);

/// A closed set of views addressed by kebab-case name.
pub trait ViewSet: Copy + Eq + fmt::Debug + 'static {
    const INITIAL: Self;
    const ALL: &'static [Self];

    fn name(self) -> &'static str;
}

fn parse_view<V: ViewSet>(s: &str) -> Result<V, UnknownView> {
    let wanted = s.trim();
    V::ALL
        .iter()
        .copied()
        .find(|v| v.name() == wanted)
        .ok_or_else(|| UnknownView(wanted.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoctorView {
    Dashboard,
    Appointments,
    Patients,
    ScanQr,
    PatientReport,
    Messages,
    Reports,
    Settings,
}

impl ViewSet for DoctorView {
    const INITIAL: Self = DoctorView::Dashboard;
    const ALL: &'static [Self] = &[
        DoctorView::Dashboard,
        DoctorView::Appointments,
        DoctorView::Patients,
        DoctorView::ScanQr,
        DoctorView::PatientReport,
        DoctorView::Messages,
        DoctorView::Reports,
        DoctorView::Settings,
    ];

    fn name(self) -> &'static str {
        match self {
            DoctorView::Dashboard => "dashboard",
            DoctorView::Appointments => "appointments",
            DoctorView::Patients => "patients",
            DoctorView::ScanQr => "scan-qr",
            DoctorView::PatientReport => "patient-report",
            DoctorView::Messages => "messages",
            DoctorView::Reports => "reports",
            DoctorView::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientView {
    Home,
    Appointment,
    MedicalReports,
    InsuranceDetails,
    PatientQr,
    GeneralCheckups,
    PreventiveCare,
    TelehealthConsultations,
    EmergencyCare,
    About,
    Contact,
    Auth,
}

impl ViewSet for PatientView {
    const INITIAL: Self = PatientView::Home;
    const ALL: &'static [Self] = &[
        PatientView::Home,
        PatientView::Appointment,
        PatientView::MedicalReports,
        PatientView::InsuranceDetails,
        PatientView::PatientQr,
        PatientView::GeneralCheckups,
        PatientView::PreventiveCare,
        PatientView::TelehealthConsultations,
        PatientView::EmergencyCare,
        PatientView::About,
        PatientView::Contact,
        PatientView::Auth,
    ];

    fn name(self) -> &'static str {
        match self {
            PatientView::Home => "home",
            PatientView::Appointment => "appointment",
            PatientView::MedicalReports => "medical-reports",
            PatientView::InsuranceDetails => "insurance-details",
            PatientView::PatientQr => "patient-qr",
            PatientView::GeneralCheckups => "general-checkups",
            PatientView::PreventiveCare => "preventive-care",
            PatientView::TelehealthConsultations => "telehealth-consultations",
            PatientView::EmergencyCare => "emergency-care",
            PatientView::About => "about",
            PatientView::Contact => "contact",
            PatientView::Auth => "auth",
        }
    }
}

impl fmt::Display for DoctorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for PatientView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DoctorView {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_view(s)
    }
}

impl FromStr for PatientView {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_view(s)
    }
}

/// Current view plus an optional inline notice (the last failure message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator<V> {
    current: V,
    notice: Option<String>,
}

impl<V: ViewSet> Default for Navigator<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ViewSet> Navigator<V> {
    /// A navigator on the view set's initial view, with no notice.
    ///
    /// # Returns
    /// `Navigator` showing `V::INITIAL`
    pub fn new() -> Self {
        Self {
            current: V::INITIAL,
            notice: None,
        }
    }

    pub fn current(&self) -> V {
        self.current
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Explicit user navigation. Clears any attached notice.
    pub fn navigate(&mut self, view: V) {
        tracing::debug!(from = self.current.name(), to = view.name(), "navigate");
        self.current = view;
        self.notice = None;
    }

    pub fn attach_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}

impl Navigator<DoctorView> {
    /// A lookup has started; the report view shows its loading state.
    pub fn lookup_started(&mut self) {
        self.navigate(DoctorView::PatientReport);
    }

    pub fn lookup_succeeded(&mut self) {
        self.navigate(DoctorView::PatientReport);
    }

    /// Back to the scanner so the user can retry, with `message` shown inline.
    pub fn lookup_failed(&mut self, message: impl Into<String>) {
        self.current = DoctorView::ScanQr;
        self.notice = Some(message.into());
        tracing::info!(view = self.current.name(), notice = ?self.notice, "returned to scanner");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_views() {
        assert_eq!(Navigator::<DoctorView>::new().current(), DoctorView::Dashboard);
        assert_eq!(Navigator::<PatientView>::new().current(), PatientView::Home);
    }

    #[test]
    fn names_round_trip() {
        for view in DoctorView::ALL {
            assert_eq!(view.to_string().parse::<DoctorView>(), Ok(*view));
        }
        for view in PatientView::ALL {
            assert_eq!(view.to_string().parse::<PatientView>(), Ok(*view));
        }
        assert_eq!(DoctorView::ScanQr.to_string(), "scan-qr");
        assert_eq!(
            "telehealth-consultations".parse::<PatientView>(),
            Ok(PatientView::TelehealthConsultations)
        );
    }

    #[test]
    fn unknown_view_is_rejected() {
        assert_eq!(
            "ScanQr".parse::<DoctorView>(),
            Err(UnknownView("ScanQr".into()))
        );
        assert!("scan-qr".parse::<PatientView>().is_err());
    }

    #[test]
    fn lookup_signals_route_doctor_views() {
        let mut nav = Navigator::<DoctorView>::new();
        nav.navigate(DoctorView::ScanQr);

        nav.lookup_failed("Patient not found with ID: 999");
        assert_eq!(nav.current(), DoctorView::ScanQr);
        assert_eq!(nav.notice(), Some("Patient not found with ID: 999"));

        nav.lookup_succeeded();
        assert_eq!(nav.current(), DoctorView::PatientReport);
        assert_eq!(nav.notice(), None);
    }

    #[test]
    fn explicit_navigation_clears_notice() {
        let mut nav = Navigator::<DoctorView>::new();
        nav.lookup_failed("Failed to fetch patient data");
        nav.navigate(DoctorView::Messages);
        assert_eq!(nav.current(), DoctorView::Messages);
        assert_eq!(nav.notice(), None);
    }
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use swastha_core::models::AppointmentRequest;
use swastha_core::report::{filter_by_category, ReportPanel, ReportSummary};
use swastha_core::scanner::{GrayFrame, QrDecoder, RqrrDecoder};
use swastha_core::{
    resolve_identifier, DecodeError, HttpBackend, LookupOrchestrator, LookupOutcome, PortalConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "swastha")]
#[command(about = "Swastha patient portal CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a scanned payload to a patient identifier
    Resolve {
        /// Raw text decoded from the QR code
        payload: String,
    },
    /// Decode the QR code in an image file
    Decode {
        /// PNG or JPEG snapshot
        image: PathBuf,
    },
    /// Look up the patient a payload refers to and print their report
    Lookup {
        /// Raw text decoded from the QR code
        payload: String,
    },
    /// List all reports
    Reports {
        /// Only show this category (`all` for every report)
        #[arg(long, default_value = "all")]
        category: String,
    },
    /// List hospitals
    Hospitals,
    /// List departments
    Departments,
    /// List doctors in a department
    Doctors {
        /// Department name
        department: String,
    },
    /// List bookable time slots
    Timeslots,
    /// Book an appointment
    Book {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        gender: String,
        /// Hospital id
        #[arg(long)]
        hospital: String,
        #[arg(long)]
        department: String,
        /// Doctor id
        #[arg(long)]
        doctor: String,
        /// Appointment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Time slot value, e.g. 09:00
        #[arg(long)]
        time: String,
        #[arg(long)]
        reason: String,
    },
}

/// Lines to print for a scanned frame. A frame without a code is not an error; a decoder
/// failure or an unusable payload is.
fn describe_scan<D: QrDecoder>(decoder: &D, frame: &D::Frame) -> anyhow::Result<Vec<String>> {
    let payload = match decoder.decode(frame) {
        Ok(payload) => payload,
        Err(DecodeError::NotFound) => return Ok(vec!["No QR code found.".to_string()]),
        Err(e) => return Err(e).context("Error decoding QR code"),
    };
    let id = resolve_identifier(&payload)?;
    Ok(vec![format!("Payload: {}", payload), format!("Patient ID: {}", id)])
}

fn backend() -> anyhow::Result<(PortalConfig, HttpBackend)> {
    let cfg = PortalConfig::from_values(|name| std::env::var(name).ok())?;
    let backend = HttpBackend::new(&cfg)?;
    Ok((cfg, backend))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("swastha=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Resolve { payload }) => {
            let id = resolve_identifier(&payload)?;
            println!("Patient ID: {}", id);
        }
        Some(Commands::Decode { image }) => {
            let frame = GrayFrame::load(&image)
                .with_context(|| format!("failed to read {}", image.display()))?;
            for line in describe_scan(&RqrrDecoder, &frame)? {
                println!("{}", line);
            }
        }
        Some(Commands::Lookup { payload }) => {
            let id = resolve_identifier(&payload)?;
            let (cfg, backend) = backend()?;
            let orchestrator = LookupOrchestrator::new(backend, cfg.request_timeout());
            if let LookupOutcome::Published(_) = orchestrator.lookup(id).await {
                print!("{}", ReportPanel::from_state(&orchestrator.state()));
            }
        }
        Some(Commands::Reports { category }) => {
            let (_, backend) = backend()?;
            let reports = backend.list_reports().await?;
            let summaries: Vec<ReportSummary> = reports.iter().map(ReportSummary::from).collect();
            let shown = filter_by_category(&summaries, &category);
            if shown.is_empty() {
                println!("No reports found.");
            }
            for summary in shown {
                println!("{}", summary);
            }
        }
        Some(Commands::Hospitals) => {
            let (_, backend) = backend()?;
            for hospital in backend.hospitals().await? {
                match hospital.location {
                    Some(location) => println!("{}: {} ({})", hospital.id, hospital.name, location),
                    None => println!("{}: {}", hospital.id, hospital.name),
                }
            }
        }
        Some(Commands::Departments) => {
            let (_, backend) = backend()?;
            for department in backend.departments().await? {
                println!("{}: {}", department.id, department.name);
            }
        }
        Some(Commands::Doctors { department }) => {
            let (_, backend) = backend()?;
            let doctors = backend.doctors(&department).await?;
            if doctors.is_empty() {
                println!("No doctors found in {}.", department);
            }
            for doctor in doctors {
                println!(
                    "{}: {} {}",
                    doctor.id,
                    doctor.name,
                    doctor.specialization.unwrap_or_default()
                );
            }
        }
        Some(Commands::Timeslots) => {
            let (_, backend) = backend()?;
            for slot in backend.time_slots().await? {
                println!("{} ({})", slot.time, slot.value);
            }
        }
        Some(Commands::Book {
            full_name,
            age,
            phone,
            gender,
            hospital,
            department,
            doctor,
            date,
            time,
            reason,
        }) => {
            let (_, backend) = backend()?;
            let request = AppointmentRequest {
                full_name,
                age,
                phone_number: phone,
                gender,
                selected_hospital: hospital,
                selected_department: department,
                selected_doctor: doctor,
                selected_date: date,
                selected_time: time,
                reason_for_appointment: reason,
            };
            let booked = backend
                .book_appointment(&request)
                .await
                .context("Error booking appointment")?;
            println!("Booked appointment {}", booked.id);
        }
        None => {
            println!("Use 'swastha --help' for commands");
        }
    }

    Ok(())
}

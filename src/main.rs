use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swastha_core::report::ReportPanel;
use swastha_core::scanner::{
    Camera, ImageDirCamera, QrDecoder, RqrrDecoder, Scanner, TextDecoder, WedgeCamera,
};
use swastha_core::{
    DoctorView, HttpBackend, LookupOrchestrator, LookupOutcome, PortalConfig, ScanSession,
    ViewSet,
};

/// Directory a camera app drops snapshots into.
const FRAMES_DIR_ENV: &str = "SWASTHA_FRAMES_DIR";
/// Line-oriented hand-held scanner device or FIFO.
const SCANNER_DEVICE_ENV: &str = "SWASTHA_SCANNER_DEVICE";

const HELP: &str = "\
commands:
  scan         open the scanner
  stop         close the scanner
  go <view>    switch view (see `views`)
  report       show the report view
  views        list views
  help         show this help
  quit         exit";

type Session<C, D> = ScanSession<HttpBackend, C, D>;
type PendingLookup = Pin<Box<dyn Future<Output = LookupOutcome> + Send>>;

/// Doctor-side scan console
///
/// Reads configuration once, then runs one loop over console commands and scanner events.
/// A decoded code is resolved, looked up, and presented on the report view; failures return
/// to the scanner view with the message shown.
///
/// # Environment Variables
/// - `SWASTHA_BACKEND_URL`: backend base URL (required)
/// - `SWASTHA_REQUEST_TIMEOUT_SECS`: lookup timeout (default: 15)
/// - `SWASTHA_SCAN_INTERVAL_MS`: frame polling interval (default: 500)
/// - `SWASTHA_FRAMES_DIR` or `SWASTHA_SCANNER_DEVICE`: frame source
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("swastha=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = PortalConfig::from_values(|name| std::env::var(name).ok())
        .context("invalid portal configuration")?;
    let backend = HttpBackend::new(&cfg)?;
    let orchestrator = Arc::new(LookupOrchestrator::new(backend, cfg.request_timeout()));
    tracing::info!(backend = %cfg.backend_base(), "swastha console starting");

    if let Ok(dir) = std::env::var(FRAMES_DIR_ENV) {
        let scanner = Scanner::new(ImageDirCamera::new(dir), RqrrDecoder, cfg.scan_interval());
        run(ScanSession::new(scanner, orchestrator)).await
    } else if let Ok(device) = std::env::var(SCANNER_DEVICE_ENV) {
        let scanner = Scanner::new(WedgeCamera::new(device), TextDecoder, cfg.scan_interval());
        run(ScanSession::new(scanner, orchestrator)).await
    } else {
        bail!("no frame source configured (set {FRAMES_DIR_ENV} or {SCANNER_DEVICE_ENV})")
    }
}

async fn run<C, D>(mut session: Session<C, D>) -> anyhow::Result<()>
where
    C: Camera,
    D: QrDecoder<Frame = C::Frame>,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");
    print_status(&session);

    // Commands stay live while a lookup is in flight; its outcome is applied when it lands.
    let mut lookup: Option<PendingLookup> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !command(&mut session, line.trim()).await {
                    break;
                }
            }
            event = session.next_event() => {
                if let Some(ticket) = session.accept_event(event).await {
                    lookup = Some(Box::pin(session.pending_lookup(ticket)));
                }
            }
            outcome = async {
                match lookup.as_mut() {
                    Some(pending) => pending.await,
                    None => std::future::pending().await,
                }
            }, if lookup.is_some() => {
                lookup = None;
                session.finish_lookup(outcome);
            }
        }
        print_status(&session);
    }

    session.close_scanner().await;
    tracing::info!("swastha console stopped");
    Ok(())
}

/// Apply one console command. Returns `false` to quit.
async fn command<C, D>(session: &mut Session<C, D>, line: &str) -> bool
where
    C: Camera,
    D: QrDecoder<Frame = C::Frame>,
{
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (None, _) => {}
        (Some("scan"), _) => {
            // Failure is already shown as the view's notice.
            let _ = session.open_scanner();
        }
        (Some("stop"), _) => session.close_scanner().await,
        (Some("go"), Some(name)) => match name.parse::<DoctorView>() {
            Ok(DoctorView::ScanQr) => {
                let _ = session.open_scanner();
            }
            Ok(view) => session.navigate(view).await,
            Err(e) => println!("{e}"),
        },
        (Some("report"), _) => session.navigate(DoctorView::PatientReport).await,
        (Some("views"), _) => {
            let names: Vec<&str> = DoctorView::ALL.iter().map(|v| v.name()).collect();
            println!("{}", names.join(", "));
        }
        (Some("help"), _) => println!("{HELP}"),
        (Some("quit" | "exit"), _) => return false,
        (Some(other), _) => println!("unknown command: {other} (try `help`)"),
    }
    true
}

fn print_status<C, D>(session: &Session<C, D>)
where
    C: Camera,
    D: QrDecoder<Frame = C::Frame>,
{
    println!("[{}] {:?}", session.view(), session.phase());
    if let Some(notice) = session.notice() {
        println!("! {notice}");
    }
    if session.view() == DoctorView::PatientReport {
        let state = session.lookup_state();
        print!("{}", ReportPanel::from_state(&state));
    }
}

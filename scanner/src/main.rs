//! Scanner binary entry point
//!
//! Reads decoded QR payloads from stdin, one per line, e.g. piped from an
//! external decoder such as `zbarcam --raw`, and runs them through a scan
//! session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;

use scanner::{
    CsvAttendanceSheet, LineSource, PhoneRule, RegistryPolicy, ScanSession, ScannerConfig, ScannerResult, TwilioConfig,
    WhatsAppNotifier,
};
use shared::{component_debug, component_info, component_warn};
use shared::{logging, ComponentId, CountryCode, DecodedFrame};

#[derive(Parser)]
#[command(name = "scanner")]
#[command(about = "Event check-in scanner: dedupes QR decodes, records attendance and sends welcome messages")]
struct Args {
    /// Seconds before the same code is accepted again
    #[arg(long, default_value = "5")]
    cooldown_secs: u64,

    /// Country code for national numbers
    #[arg(long, default_value = "+964")]
    country_code: String,

    /// Longest digit string treated as a national number
    #[arg(long, default_value = "11")]
    local_max_len: usize,

    /// Attendance sheet (CSV)
    #[arg(long, default_value = "attendance.csv")]
    sheet: PathBuf,

    /// Do not write an attendance sheet
    #[arg(long)]
    no_sheet: bool,

    /// Cooldown only: ignore earlier registrations in the sheet
    #[arg(long)]
    no_registry: bool,

    /// Capacity of the frame and check-in queues
    #[arg(long, default_value = "64")]
    queue_capacity: usize,

    /// Dispatcher poll timeout in milliseconds
    #[arg(long, default_value = "100")]
    poll_timeout_ms: u64,

    /// Welcome message template, `{name}` is replaced
    #[arg(long)]
    welcome_template: Option<String>,

    /// Input line that clears the scan history instead of being scanned
    #[arg(long)]
    reset_marker: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn scanner_config(&self) -> ScannerResult<ScannerConfig> {
        let country_code: CountryCode = self.country_code.parse()?;

        let mut config = ScannerConfig {
            cooldown: Duration::from_secs(self.cooldown_secs),
            phone_rule: PhoneRule::new(country_code, self.local_max_len),
            registry_policy: if self.no_registry {
                RegistryPolicy::SessionCooldown
            } else {
                RegistryPolicy::Permanent
            },
            queue_capacity: self.queue_capacity,
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            ..ScannerConfig::default()
        };
        if let Some(template) = &self.welcome_template {
            config.welcome_template = template.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ScannerResult<()> {
    let args = Args::parse();

    // .env is optional
    let _ = dotenvy::dotenv();

    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(ComponentId::Host, "event check-in scanner");

    let config = args.scanner_config()?;
    component_debug!(ComponentId::Host, config = %serde_json::to_string(&config)?, "Configuration loaded");

    // Attendance sheet
    let sheet = if args.no_sheet {
        component_warn!(ComponentId::Host, "⚠️ No attendance sheet, check-ins will not be saved");
        None
    } else {
        let sheet = CsvAttendanceSheet::new(&args.sheet);
        match sheet.ensure_exists().await {
            Ok(()) => {
                logging::log_success(ComponentId::Host, &format!("Sheet ready: {}", args.sheet.display()));
                Some(Arc::new(sheet))
            }
            Err(e) => {
                logging::log_error(ComponentId::Host, "Opening attendance sheet", &e);
                None
            }
        }
    };

    // WhatsApp notifier
    let notifier = match TwilioConfig::from_env() {
        Some(twilio) => match WhatsAppNotifier::new(twilio) {
            Ok(notifier) => {
                logging::log_success(ComponentId::Host, "Twilio connected");
                Some(Arc::new(notifier))
            }
            Err(e) => {
                logging::log_error(ComponentId::Host, "Creating Twilio client", &e);
                None
            }
        },
        None => {
            component_warn!(ComponentId::Host, "⚠️ TWILIO_SID / TWILIO_TOKEN not set, welcome messages disabled");
            None
        }
    };

    let session = ScanSession::new(config, sheet.clone(), notifier)?;
    let pipeline = session.build_pipeline(sheet.as_deref()).await;
    let handle = session.start(pipeline);

    let frames = handle.frames();
    let mut lines = LineSource::new(tokio::io::stdin());
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stop_early = false;

    component_info!(ComponentId::Host, "📷 Waiting for decoded payloads on stdin");

    loop {
        tokio::select! {
            line = lines.next_payload() => {
                let payload = match line {
                    Ok(Some(payload)) => payload,
                    Ok(None) => break,
                    Err(e) => {
                        logging::log_error(ComponentId::Host, "Reading input", &e);
                        stop_early = true;
                        break;
                    }
                };

                if args.reset_marker.as_deref() == Some(payload.as_str()) {
                    if let Err(e) = handle.reset() {
                        logging::log_error(ComponentId::Host, "Resetting scan history", &e);
                    }
                    continue;
                }

                if frames.send(DecodedFrame::now(payload)).await.is_err() {
                    component_warn!(ComponentId::Host, "⚠️ Intake stopped, no longer reading input");
                    break;
                }
            }

            _ = &mut ctrl_c => {
                logging::log_shutdown(ComponentId::Host, "Received Ctrl+C signal");
                stop_early = true;
                break;
            }
        }
    }

    // both paths drain check-ins the gate already accepted
    drop(frames);
    let summary = if stop_early {
        handle.shutdown().await?
    } else {
        handle.join().await?
    };

    logging::log_success(
        ComponentId::Host,
        &format!(
            "Session finished: {} frames, {} check-ins, {} saved, {} messages sent",
            summary.intake.frames, summary.dispatch.dispatched, summary.dispatch.stored, summary.dispatch.notified
        ),
    );
    Ok(())
}

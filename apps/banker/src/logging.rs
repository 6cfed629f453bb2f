//! Tracing setup and structured logging of events
//!
//! Every event received by the CLI is also written to the tracing
//! subscriber with structured fields, so `--debug` log files carry the full
//! grant/deny/release history of a run.

use banker_events::{AppEvent, DenialKind, EventMessage, LedgerEvent, SimulationEvent};
use std::path::PathBuf;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_DEBUG_FILTER: &str = "info,banker=debug,banker_resources=debug,banker_sim=debug";
const DEFAULT_FILTER: &str = "warn,banker=warn";

/// Directory for `--debug` log files
fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("banker")
        .join("logs")
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Open a fresh timestamped log file
fn create_log_file() -> std::io::Result<(PathBuf, std::fs::File)> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!(
        "banker-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    let file = std::fs::File::create(&path)?;
    Ok((path, file))
}

/// Initialize tracing/logging
pub fn init_tracing(json_mode: bool, debug_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_flag;

    if json_mode {
        // JSON mode: keep stdout clean for the result document
        if debug_enabled {
            if let Ok((_, file)) = create_log_file() {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(env_filter(DEFAULT_DEBUG_FILTER))
                    .init();
                return;
            }
        }
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        match create_log_file() {
            Ok((path, file)) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(env_filter(DEFAULT_DEBUG_FILTER))
                    .init();
                eprintln!("Debug logging enabled: {}", path.display());
            }
            Err(e) => {
                eprintln!("Warning: Failed to create log file: {e}");
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(env_filter("info,banker=info"))
                    .init();
            }
        }
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter(DEFAULT_FILTER))
            .init();
    }
}

/// Log an event with structured fields at the level the event asks for
pub fn log_event_with_tracing(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;

    match event {
        AppEvent::Ledger(ledger_event) => match ledger_event {
            LedgerEvent::Initialized {
                total,
                requesters,
                policy,
                safe_sequence,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    total = %total,
                    requesters = requesters,
                    policy = %policy,
                    safe_sequence = ?safe_sequence,
                    "Ledger initialized"
                );
            }
            LedgerEvent::RequestGranted {
                requester,
                request,
                available,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    requester = %requester,
                    request = %request,
                    available = %available,
                    "Request granted"
                );
            }
            LedgerEvent::RequestDenied {
                requester,
                request,
                kind,
                phase,
                failure,
            } => match kind {
                DenialKind::InsufficientAvailable => {
                    debug!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        requester = %requester,
                        request = %request,
                        phase = %phase,
                        message = %failure.message,
                        "Request denied"
                    );
                }
                DenialKind::Unsafe => {
                    info!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        requester = %requester,
                        request = %request,
                        phase = %phase,
                        message = %failure.message,
                        "Request denied"
                    );
                }
                DenialKind::ContractViolation => {
                    warn!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        requester = %requester,
                        request = %request,
                        phase = %phase,
                        code = ?failure.code,
                        message = %failure.message,
                        hint = ?failure.hint,
                        "Request rejected"
                    );
                }
            },
            LedgerEvent::Released {
                requester,
                release,
                available,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    requester = %requester,
                    release = %release,
                    available = %available,
                    "Released"
                );
            }
            LedgerEvent::ReleaseRejected {
                requester,
                release,
                failure,
            } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    requester = %requester,
                    release = %release,
                    code = ?failure.code,
                    message = %failure.message,
                    "Release rejected"
                );
            }
        },

        AppEvent::Simulation(SimulationEvent::RequesterFailed { requester, failure }) => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                requester = %requester,
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Requester failed"
            );
        }

        // Fallback for the remaining events
        _ => match meta.tracing_level() {
            tracing::Level::ERROR => {
                error!(source = meta.source.as_str(), event_id = %meta.event_id, event = ?event, "Application event");
            }
            tracing::Level::WARN => {
                warn!(source = meta.source.as_str(), event_id = %meta.event_id, event = ?event, "Application event");
            }
            tracing::Level::INFO => {
                info!(source = meta.source.as_str(), event_id = %meta.event_id, event = ?event, "Application event");
            }
            tracing::Level::DEBUG => {
                debug!(source = meta.source.as_str(), event_id = %meta.event_id, event = ?event, "Application event");
            }
            tracing::Level::TRACE => {
                trace!(source = meta.source.as_str(), event_id = %meta.event_id, event = ?event, "Application event");
            }
        },
    }
}

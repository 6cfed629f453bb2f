//! banker - Deadlock-avoiding resource allocator
//!
//! This is the CLI application: it builds the resource ledger from
//! configuration and arguments, then either reports the initial state
//! (`check`) or drives concurrent requesters against it (`run`).

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands};
use crate::display::{OutputRenderer, StateView};
use crate::error::CliError;
use crate::events::EventHandler;
use banker_config::Config;
use banker_errors::SimulationError;
use banker_events::{AppEvent, EventEmitter, EventReceiver, EventSender, LedgerEvent};
use banker_resources::{Ledger, ResourceManager};
use banker_sim::{BackoffPolicy, Simulation, SimulationReport};
use banker_types::{ColorChoice, OutputFormat};
use clap::Parser;
use std::future::Future;
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    logging::init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!(code = ?e.code(), "Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting banker v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command)?;
    config.validate()?;

    let color = config.general.color;
    let format = if cli.global.json {
        OutputFormat::Json
    } else {
        config.general.default_output
    };
    let renderer = OutputRenderer::new(format, color);

    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(
        colors_enabled,
        cli.global.debug,
        format == OutputFormat::Json,
    );

    let (event_sender, mut event_receiver) = banker_events::channel();
    let manager = Arc::new(build_manager(&config, event_sender.clone())?);
    while let Ok(event) = event_receiver.try_recv() {
        event_handler.handle_event(event);
    }

    let initial_snapshot = manager.snapshot()?;
    let initial_sequence = manager.safe_sequence()?;
    let initial = StateView {
        policy: config.ledger.policy,
        snapshot: &initial_snapshot,
        safe_sequence: initial_sequence.as_deref(),
    };

    match cli.command {
        Commands::Check { .. } => {
            renderer.render_check(&initial)?;
            if initial_sequence.is_none() {
                return Err(SimulationError::InitialStateUnsafe.into());
            }
        }
        Commands::Run { .. } => {
            renderer.render_initial_state(&initial)?;
            if initial_sequence.is_none() {
                return Err(SimulationError::InitialStateUnsafe.into());
            }

            let simulation = Simulation::new(
                Arc::clone(&manager),
                config.simulation.clone(),
                BackoffPolicy::from(&config.backoff),
                Some(event_sender),
            );
            let report = run_with_events(
                simulation.run(config.simulation.duration()),
                event_receiver,
                &mut event_handler,
            )
            .await?;

            renderer.render_report(&initial, &report)?;
            if !report.final_safe {
                return Err(SimulationError::FinalStateUnsafe.into());
            }
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Build the ledger from configuration and wrap it for sharing
fn build_manager(config: &Config, event_sender: EventSender) -> Result<ResourceManager, CliError> {
    let ledger = Ledger::initialize_with_policy(
        config.ledger.total_vector(),
        config.ledger.maximum_rows(),
        config.ledger.policy,
    )?;

    let manager = ResourceManager::new(ledger).with_event_sender(event_sender);
    let snapshot = manager.snapshot()?;
    manager.emit(AppEvent::Ledger(LedgerEvent::Initialized {
        total: snapshot.total,
        requesters: manager.requesters(),
        policy: config.ledger.policy,
        safe_sequence: manager.safe_sequence()?.unwrap_or_default(),
    }));
    Ok(manager)
}

/// Drive the simulation while handling its events as they arrive
async fn run_with_events(
    simulation: impl Future<Output = Result<SimulationReport, banker_errors::Error>>,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<SimulationReport, CliError> {
    let mut simulation = Box::pin(simulation);

    loop {
        select! {
            result = &mut simulation => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result.map_err(CliError::from);
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for the simulation */ }
                }
            }
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(
    config: &mut Config,
    global: &cli::GlobalArgs,
    command: &Commands,
) -> Result<(), CliError> {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    let totals = command.totals();
    if !totals.is_empty() {
        let expected = config.ledger.maximum.first().map_or(totals.len(), Vec::len);
        if totals.len() != expected {
            return Err(CliError::InvalidArguments(format!(
                "expected {expected} totals, one per resource type, but got {}",
                totals.len()
            )));
        }
        config.ledger.total = totals.to_vec();
    }
    if let Some(policy) = command.policy() {
        config.ledger.policy = policy;
    }

    if let Commands::Run { duration, seed, .. } = command {
        if let Some(duration) = duration {
            config.simulation.duration_secs = *duration;
        }
        if seed.is_some() {
            config.simulation.seed = *seed;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::try_parse_from([
            "banker",
            "--color",
            "never",
            "run",
            "4",
            "4",
            "4",
            "4",
            "4",
            "--duration",
            "2",
            "--seed",
            "8",
        ])
        .unwrap();
        let mut config = Config::default();

        apply_cli_config(&mut config, &cli.global, &cli.command).unwrap();

        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.ledger.total, vec![4, 4, 4, 4, 4]);
        assert_eq!(config.simulation.duration_secs, 2);
        assert_eq!(config.simulation.seed, Some(8));
        assert_eq!(config.simulation.duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_totals_must_cover_every_resource_type() {
        let cli = Cli::try_parse_from(["banker", "check", "10", "5", "7"]).unwrap();
        let mut config = Config::default();

        let err = apply_cli_config(&mut config, &cli.global, &cli.command).unwrap_err();
        assert_eq!(err.code(), Some("cli.invalid_arguments"));
        assert!(err.to_string().contains("expected 5 totals"), "{err}");
        assert_eq!(config.ledger.total, vec![10, 5, 7, 3, 2]);
    }

    #[test]
    fn test_build_manager_reports_infeasible_totals() {
        let mut config = Config::default();
        config.ledger.total = vec![1, 1, 1, 1, 1];
        let (tx, _rx) = banker_events::channel();

        let err = build_manager(&config, tx).unwrap_err();
        assert_eq!(err.code(), Some("ledger.infeasible_demand"));
    }

    #[tokio::test]
    async fn test_build_manager_announces_initial_state() {
        let (tx, mut rx) = banker_events::channel();
        let manager = build_manager(&Config::default(), tx).unwrap();

        assert_eq!(manager.requesters(), 5);
        let message = rx.recv().await.unwrap();
        match message.event {
            AppEvent::Ledger(LedgerEvent::Initialized {
                requesters,
                safe_sequence,
                ..
            }) => {
                assert_eq!(requesters, 5);
                assert_eq!(safe_sequence.len(), 5);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

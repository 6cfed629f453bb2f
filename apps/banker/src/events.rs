//! Event handling and live status display

use banker_events::{AppEvent, DenialKind, EventMessage, LedgerEvent, SimulationEvent};
use console::{Style, Term};

use crate::logging::log_event_with_tracing;

/// Turns events into log records and, outside JSON mode, status lines
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    /// Show per-request ledger traffic, not just lifecycle lines
    verbose: bool,
    /// JSON mode: log only, never print
    quiet: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors_enabled: bool, verbose: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            verbose,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);

        if self.quiet {
            return;
        }
        if let Some(line) = self.format_event(&message.event) {
            self.show_status(&line);
        }
    }

    /// Status line for an event, `None` when it is not shown
    fn format_event(&self, event: &AppEvent) -> Option<String> {
        match event {
            AppEvent::Ledger(ledger_event) => self.format_ledger_event(ledger_event),
            AppEvent::Simulation(sim_event) => self.format_simulation_event(sim_event),
        }
    }

    fn format_ledger_event(&self, event: &LedgerEvent) -> Option<String> {
        if !self.verbose {
            return None;
        }
        let line = match event {
            LedgerEvent::Initialized { .. } => return None,
            LedgerEvent::RequestGranted {
                requester,
                request,
                available,
            } => self.paint(
                &Style::new().green(),
                &format!("{requester} granted {request}, available {available}"),
            ),
            LedgerEvent::RequestDenied {
                requester,
                request,
                kind,
                ..
            } => {
                let reason = match kind {
                    DenialKind::InsufficientAvailable => "not enough free units",
                    DenialKind::Unsafe => "would be unsafe",
                    DenialKind::ContractViolation => "invalid request",
                };
                self.paint(
                    &Style::new().yellow(),
                    &format!("{requester} denied {request}: {reason}"),
                )
            }
            LedgerEvent::Released {
                requester,
                release,
                available,
            } => format!("{requester} released {release}, available {available}"),
            LedgerEvent::ReleaseRejected {
                requester, failure, ..
            } => self.paint(
                &Style::new().red(),
                &format!("{requester} release rejected: {}", failure.message),
            ),
        };
        Some(line)
    }

    fn format_simulation_event(&self, event: &SimulationEvent) -> Option<String> {
        match event {
            SimulationEvent::Started {
                requesters,
                duration,
            } => Some(format!(
                "Running {requesters} requesters for {}s",
                duration.as_secs()
            )),
            SimulationEvent::Tick { elapsed } => {
                self.verbose.then(|| format!("t+{}s", elapsed.as_secs()))
            }
            SimulationEvent::Stopping => Some("Stopping requesters".to_string()),
            SimulationEvent::RequesterExited {
                requester,
                grants,
                denials,
            } => Some(format!(
                "{requester} exited after {grants} grants and {denials} denials"
            )),
            SimulationEvent::RequesterFailed { requester, failure } => Some(self.paint(
                &Style::new().red(),
                &format!("{requester} failed: {}", failure.message),
            )),
            SimulationEvent::RequesterStarted { .. }
            | SimulationEvent::RequesterHolding { .. }
            | SimulationEvent::Completed { .. } => None,
        }
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        if self.colors_enabled {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Show status message
    fn show_status(&self, message: &str) {
        self.term.write_line(message).unwrap_or(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banker_events::FailureContext;
    use banker_types::{RequestPhase, RequesterId, ResourceVector};
    use std::time::Duration;

    fn denied() -> AppEvent {
        AppEvent::Ledger(LedgerEvent::RequestDenied {
            requester: RequesterId(2),
            request: ResourceVector::from([1, 0]),
            kind: DenialKind::Unsafe,
            phase: RequestPhase::RolledBack,
            failure: FailureContext::new(
                Some("request.unsafe"),
                "unsafe",
                None::<String>,
                true,
            ),
        })
    }

    #[test]
    fn test_ledger_traffic_only_in_verbose_mode() {
        let quiet = EventHandler::new(false, false, false);
        assert!(quiet.format_event(&denied()).is_none());

        let verbose = EventHandler::new(false, true, false);
        assert_eq!(
            verbose.format_event(&denied()).as_deref(),
            Some("C2 denied [1, 0]: would be unsafe")
        );
    }

    #[test]
    fn test_lifecycle_lines_always_shown() {
        let handler = EventHandler::new(false, false, false);
        let line = handler.format_event(&AppEvent::Simulation(SimulationEvent::RequesterExited {
            requester: RequesterId(0),
            grants: 3,
            denials: 1,
        }));
        assert_eq!(line.as_deref(), Some("C0 exited after 3 grants and 1 denials"));

        let tick = AppEvent::Simulation(SimulationEvent::Tick {
            elapsed: Duration::from_secs(2),
        });
        assert!(handler.format_event(&tick).is_none());
    }

    #[test]
    fn test_handle_event_in_json_mode_does_not_print() {
        let mut handler = EventHandler::new(false, true, true);
        handler.handle_event(EventMessage::new(denied()));
    }
}

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for the banker resource manager
//!
//! The ledger and the simulation driver report what happens through events;
//! only the CLI decides how they are printed or logged.
//!
//! ## Architecture
//!
//! - **Domain-driven events**: `Ledger` and `Simulation` domains
//! - **Unified `EventEmitter` trait**: one API whether you hold a raw sender
//!   or a struct that owns one
//! - **Tracing integration**: every event carries an `EventMeta` with the log
//!   level and source derived from the payload

pub mod meta;
pub use meta::{EventLevel, EventMessage, EventMeta, EventSource};

pub mod events;
pub use events::{AppEvent, DenialKind, FailureContext, LedgerEvent, SimulationEvent};

use banker_types::{RequesterId, ResourceVector};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Type alias for the event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for the event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout banker
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(EventMessage::new(event));
        }
    }

    /// Emit a request granted event
    fn emit_request_granted(
        &self,
        requester: RequesterId,
        request: ResourceVector,
        available: ResourceVector,
    ) {
        self.emit(AppEvent::Ledger(LedgerEvent::RequestGranted {
            requester,
            request,
            available,
        }));
    }

    /// Emit a released event
    fn emit_released(
        &self,
        requester: RequesterId,
        release: ResourceVector,
        available: ResourceVector,
    ) {
        self.emit(AppEvent::Ledger(LedgerEvent::Released {
            requester,
            release,
            available,
        }));
    }

    /// Emit a simulation tick
    fn emit_tick(&self, elapsed: Duration) {
        self.emit(AppEvent::Simulation(SimulationEvent::Tick { elapsed }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

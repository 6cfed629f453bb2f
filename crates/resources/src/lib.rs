#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deadlock-avoiding resource management for banker
//!
//! This crate implements the Banker's algorithm: a [`Ledger`] tracks
//! available, maximum, allocated and still-needed units per requester, the
//! [`safety`] module decides whether a state still has a finishing order,
//! and [`ResourceManager`] serializes requests and releases from concurrent
//! requesters through a single lock.

pub mod ledger;
pub mod manager;
pub mod protocol;
pub mod safety;

pub use ledger::Ledger;
pub use manager::ResourceManager;
pub use protocol::{denial_phase, Grant};
pub use safety::{is_safe, safe_sequence};

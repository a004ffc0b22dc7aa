//! Realtime fan-out of task events to live connections.
//!
//! The [`Hub`] owns every registered connection's outbound queue. A
//! [`Connection`] bridges one transport to its queue with an outbound loop
//! (queued events and heartbeats) and an inbound loop (liveness and close
//! detection).

pub mod connection;
pub mod event;
pub mod hub;

use std::time::Duration;

use thiserror::Error;

pub use connection::{Connection, ConnectionConfig, Frame};
pub use event::{Event, EventKind};
pub use hub::{ConnectionId, Hub, HubConfig, Scope, Subscription};

/// Failures of the realtime layer. None of these are surfaced to HTTP callers
/// of task operations; they end a single connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RealtimeError {
    #[error("Realtime hub is shut down")]
    HubShutDown,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Write did not complete within {0:?}")]
    WriteTimeout(Duration),

    #[error("No frame received within {0:?}")]
    IdleTimeout(Duration),
}

//! Connection to the syslog collector.
//!
//! [`ConnectionManager`] holds at most one TLS-over-TCP session. It connects
//! lazily, tears the session down on the first write error, and reconnects on
//! the next send. There is no retry loop: every failure is returned to the
//! caller with the collector endpoint and the underlying I/O error.

mod manager;
mod transport;


use std::io;

use thiserror::Error;

pub use manager::ConnectionManager;
pub use transport::{Connector, TlsConnector, Transport};

/// Observable state of a [`ConnectionManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has been opened, or the last one was closed.
    Disconnected,
    /// A live session is held.
    Connected,
    /// The last connect or write failed; the next send reconnects.
    Failed,
}

/// Failures surfaced by [`ConnectionManager`].
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// TCP connect or TLS handshake failed.
    #[error("unable to create socket with {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Writing to an open session failed; the session has been dropped.
    #[error("{source} writing to '{endpoint}'")]
    Write {
        endpoint: String,
        #[source]
        source: io::Error,
    },
}

impl ConnectionError {
    /// The `host:port` the failure relates to.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Connect { endpoint, .. } | Self::Write { endpoint, .. } => endpoint,
        }
    }
}

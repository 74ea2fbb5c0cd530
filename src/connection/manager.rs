//! Lifecycle of the single collector connection.

use std::{
    io::{self, Write},
    mem,
};

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::{config::LogglyConfig, encoder::Packet};

use super::{
    ConnectionError, ConnectionState,
    transport::{Connector, TlsConnector, Transport},
};

enum Slot<S> {
    Disconnected,
    Connected(S),
    Failed,
}

impl<S> Slot<S> {
    fn state(&self) -> ConnectionState {
        match self {
            Slot::Disconnected => ConnectionState::Disconnected,
            Slot::Connected(_) => ConnectionState::Connected,
            Slot::Failed => ConnectionState::Failed,
        }
    }
}

/// Owns at most one live connection to the collector.
///
/// Connections are opened lazily by [`send`](Self::send) or
/// [`ensure_connected`](Self::ensure_connected) and dropped as soon as a write
/// fails, so the next send starts from a fresh socket. Every operation runs
/// under one mutex; concurrent callers are serialised.
pub struct ConnectionManager<C: Connector = TlsConnector> {
    connector: C,
    endpoint: String,
    slot: Mutex<Slot<C::Stream>>,
}

impl ConnectionManager<TlsConnector> {
    /// Manager connecting over TLS to the configured collector.
    pub fn new(config: &LogglyConfig) -> Self {
        Self::with_connector(TlsConnector::new(config), config.endpoint())
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Manager using a custom connector. `endpoint` is only used in
    /// diagnostics.
    pub fn with_connector(connector: C, endpoint: impl Into<String>) -> Self {
        Self {
            connector,
            endpoint: endpoint.into(),
            slot: Mutex::new(Slot::Disconnected),
        }
    }

    /// `host:port` this manager reports in errors and logs.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.slot.lock().state()
    }

    fn open(&self) -> Result<C::Stream, ConnectionError> {
        info!("initializing tcp socket for {}", self.endpoint);
        self.connector.connect().map_err(|source| {
            warn!("failed to create tcp socket {}: {source}", self.endpoint);
            ConnectionError::Connect {
                endpoint: self.endpoint.clone(),
                source,
            }
        })
    }

    /// Open a connection unless one is already held.
    pub fn ensure_connected(&self) -> Result<(), ConnectionError> {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Connected(_)) {
            return Ok(());
        }
        match self.open() {
            Ok(stream) => {
                *slot = Slot::Connected(stream);
                Ok(())
            }
            Err(err) => {
                *slot = Slot::Failed;
                Err(err)
            }
        }
    }

    /// Write one packet, connecting first if needed.
    ///
    /// Makes at most one connect attempt and one write attempt. A failed
    /// write drops the connection before the error is returned.
    pub fn send(&self, packet: &Packet) -> Result<(), ConnectionError> {
        let mut slot = self.slot.lock();
        let mut stream = match mem::replace(&mut *slot, Slot::Disconnected) {
            Slot::Connected(stream) => stream,
            Slot::Disconnected | Slot::Failed => match self.open() {
                Ok(stream) => stream,
                Err(err) => {
                    *slot = Slot::Failed;
                    return Err(err);
                }
            },
        };

        match write_packet(&mut stream, packet) {
            Ok(()) => {
                *slot = Slot::Connected(stream);
                Ok(())
            }
            Err(source) => {
                warn!(
                    "closing socket after {} writing to '{}'",
                    source, self.endpoint
                );
                *slot = Slot::Failed;
                Err(ConnectionError::Write {
                    endpoint: self.endpoint.clone(),
                    source,
                })
            }
        }
    }

    /// Drop any held connection without a graceful close. The next send
    /// reconnects.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock();
        if let Slot::Connected(_) = *slot {
            debug!("invalidating connection to {}", self.endpoint);
            *slot = Slot::Failed;
        }
    }

    /// Close and release any held connection. Safe to call repeatedly.
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        if let Slot::Connected(mut stream) = mem::replace(&mut *slot, Slot::Disconnected) {
            debug!("closing connection to {}", self.endpoint);
            if let Err(err) = stream.close() {
                debug!("error while closing connection to {}: {err}", self.endpoint);
            }
        }
    }
}

fn write_packet<S: Transport>(stream: &mut S, packet: &Packet) -> io::Result<()> {
    stream.write_all(packet.as_bytes())?;
    stream.flush()
}

impl<C: Connector> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: Connector> std::fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

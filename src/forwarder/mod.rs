//! Batch delivery to the collector.
//!
//! A [`Forwarder`] walks a batch in order. Each record is routed by
//! [`token::resolve`](crate::token::resolve), encoded, and written through
//! the [`ConnectionManager`]. The first connection or write failure stops
//! the batch and is returned; requeueing the batch is the caller's job.


use log::debug;
use thiserror::Error;

use crate::{
    chunk::{ChunkError, decode_chunk},
    config::LogglyConfig,
    connection::{ConnectionError, ConnectionManager, Connector, TlsConnector},
    encoder,
    record::Entry,
    token::{self, RoutingDecision},
};

/// Failures returned from a delivery call.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Chunk(#[from] ChunkError),
}

/// Counts for one successful delivery call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Records written to the collector.
    pub sent: usize,
    /// Records dropped by the discard policy.
    pub discarded: usize,
}

/// Routes, encodes, and sends batches of records over one connection.
#[derive(Debug)]
pub struct Forwarder<C: Connector = TlsConnector> {
    config: LogglyConfig,
    connection: ConnectionManager<C>,
}

impl Forwarder<TlsConnector> {
    /// Forwarder sending to the collector named in `config` over TLS.
    pub fn new(config: LogglyConfig) -> Self {
        let connection = ConnectionManager::new(&config);
        Self { config, connection }
    }
}

impl<C: Connector> Forwarder<C> {
    /// Forwarder writing through a caller-supplied connection manager.
    pub fn with_connection(config: LogglyConfig, connection: ConnectionManager<C>) -> Self {
        Self { config, connection }
    }

    /// Configuration this forwarder was built with.
    pub fn config(&self) -> &LogglyConfig {
        &self.config
    }

    /// The connection manager packets are written through.
    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    /// Deliver `entries` in order.
    ///
    /// Stops at the first failure. Entries before the failing one have been
    /// written; entries after it have not been attempted.
    pub fn deliver<I>(&self, entries: I) -> Result<DeliveryReport, ForwardError>
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        let mut report = DeliveryReport::default();
        for entry in entries {
            let entry = entry.into();
            let token = match token::resolve(&entry.record, &self.config) {
                RoutingDecision::UseToken(token) => token,
                RoutingDecision::Discard => {
                    debug!("discarding unannotated pod record tagged {:?}", entry.tag);
                    report.discarded += 1;
                    continue;
                }
            };
            let packet = encoder::encode(
                &entry.tag,
                entry.timestamp,
                &entry.record,
                &token,
                &self.config,
            );
            self.connection.send(&packet)?;
            report.sent += 1;
        }
        Ok(report)
    }

    /// Decode a MessagePack chunk and deliver its entries.
    ///
    /// A malformed chunk is rejected before anything is sent.
    pub fn deliver_chunk(&self, chunk: &[u8]) -> Result<DeliveryReport, ForwardError> {
        let entries = decode_chunk(chunk)?;
        self.deliver(entries)
    }

    /// Close the connection. Later deliveries reconnect.
    pub fn close(&self) {
        self.connection.close();
    }
}

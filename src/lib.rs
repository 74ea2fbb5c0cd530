//! Forward structured log records to a Loggly-style syslog collector.
//!
//! Records are routed by a per-record token, encoded as RFC 5424 lines, and
//! written over a single lazily opened TLS connection:
//!
//! ```no_run
//! use loggly_syslog::{Entry, Forwarder, LogglyConfig};
//! use serde_json::json;
//!
//! let config = LogglyConfig::builder("c56a4180-65aa-42ec-a945-5fd21dec0538")
//!     .with_tag("kubernetes")
//!     .build()?;
//! let forwarder = Forwarder::new(config);
//!
//! let record = json!({ "message": "hello" }).as_object().cloned().unwrap_or_default();
//! forwarder.deliver([Entry::new("app", None, record)])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod chunk;
pub mod config;
pub mod connection;
pub mod encoder;
pub mod forwarder;
pub mod record;
pub mod token;

#[cfg(test)]
mod test_utils;

pub use chunk::{ChunkError, decode_chunk, format_entry};
pub use config::{ConfigError, LogglyConfig, LogglyConfigBuilder, TimePrecision, TlsOptions};
pub use connection::{
    ConnectionError, ConnectionManager, ConnectionState, Connector, TlsConnector, Transport,
};
pub use encoder::{Packet, encode};
pub use forwarder::{DeliveryReport, ForwardError, Forwarder};
pub use record::{Entry, Record};
pub use token::{RoutingDecision, resolve};

//! Record and entry types handed to the forwarder by the host pipeline.

use serde_json::{Map, Value};

/// One structured log line: a JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// A single `(tag, time, record)` tuple awaiting delivery.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Pipeline tag; becomes the syslog APP-NAME.
    pub tag: String,
    /// Seconds since the Unix epoch, with optional fractional part.
    pub timestamp: Option<f64>,
    /// The structured record body.
    pub record: Record,
}

impl Entry {
    /// Construct an entry from its parts.
    pub fn new(tag: impl Into<String>, timestamp: Option<f64>, record: Record) -> Self {
        Self {
            tag: tag.into(),
            timestamp,
            record,
        }
    }
}

impl<T: Into<String>> From<(T, Option<f64>, Record)> for Entry {
    fn from((tag, timestamp, record): (T, Option<f64>, Record)) -> Self {
        Self::new(tag, timestamp, record)
    }
}

//! RFC 5424 packet construction.
//!
//! Each record becomes one newline-terminated syslog line of the form
//!
//! ```text
//! <134>1 2018-05-11T02:11:58+00:00 myhost myapp - - [TOKEN@41058 tag="syslog"] {"message":"..."}
//! ```
//!
//! Priority 134 is facility local0 with severity informational. The
//! structured-data element carries the routing token under Loggly's private
//! enterprise number. Encoding never fails: a `message` field that is not
//! valid JSON is simply left in place.

mod timestamp;


use std::{borrow::Cow, fmt};

use log::warn;
use serde_json::Value;

use crate::{config::LogglyConfig, record::Record};

/// Facility local0, severity informational.
pub const PRIORITY: u8 = 134;
/// Syslog protocol version.
pub const VERSION: u8 = 1;
/// Loggly's private enterprise number.
pub const ENTERPRISE_ID: u32 = 41058;
/// RFC 5424 placeholder for an absent field.
pub const NILVALUE: &str = "-";

/// An encoded, newline-terminated syslog line.
#[derive(Clone, PartialEq, Eq)]
pub struct Packet(Vec<u8>);

impl Packet {
    #[cfg(test)]
    pub(crate) fn from_line(line: &str) -> Self {
        Packet(format!("{line}\n").into_bytes())
    }

    /// Bytes to write to the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The packet as text. Packets are always valid UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Length in bytes, including the trailing newline.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the packet holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Packet").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replace a JSON-encoded `message` with its parsed form under `log`.
///
/// Returns `None` when there is no string `message` or it does not parse.
fn normalise_json_message(record: &Record) -> Option<Record> {
    let message = record.get("message")?.as_str()?;
    let parsed: Value = serde_json::from_str(message).ok()?;
    let mut normalised = record.clone();
    normalised.shift_remove("message");
    normalised.insert("log".to_owned(), parsed);
    Some(normalised)
}

/// Escape characters RFC 5424 forbids unescaped inside a PARAM-VALUE.
fn escape_param_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', '\\', ']']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | ']') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    Cow::Owned(escaped)
}

/// Build the `[token@41058 tag="..."]` structured-data element.
pub fn structured_data(token: &str, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!(
            "[{token}@{ENTERPRISE_ID} tag=\"{}\"]",
            escape_param_value(tag)
        ),
        None => format!("[{token}@{ENTERPRISE_ID}]"),
    }
}

/// Encode one record as a syslog packet routed with `token`.
///
/// `timestamp` is seconds since the Unix epoch; `None` stamps the packet with
/// the current time. The caller's record is left untouched.
pub fn encode(
    tag: &str,
    timestamp: Option<f64>,
    record: &Record,
    token: &str,
    config: &LogglyConfig,
) -> Packet {
    let normalised = config
        .parse_json()
        .then(|| normalise_json_message(record))
        .flatten();
    let body = normalised.as_ref().unwrap_or(record);

    let app_name = if tag.is_empty() { NILVALUE } else { tag };
    let header = format!(
        "<{PRIORITY}>{VERSION} {} {} {app_name} {NILVALUE} {NILVALUE} {} ",
        timestamp::format_timestamp(timestamp, config.time_precision()),
        config.hostname().unwrap_or(NILVALUE),
        structured_data(token, config.tag()),
    );

    let mut bytes = header.into_bytes();
    match serde_json::to_vec(body) {
        Ok(json) => bytes.extend_from_slice(&json),
        Err(err) => {
            warn!("loggly encoder could not serialise record body: {err}");
            bytes.extend_from_slice(b"{}");
        }
    }
    bytes.push(b'\n');
    Packet(bytes)
}

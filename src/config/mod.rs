//! Forwarder configuration.
//!
//! [`LogglyConfig`] is immutable once built. All validation happens in
//! [`LogglyConfigBuilder::build`] so a missing token or a nonsensical timeout
//! is reported once at setup, never while records are being delivered.
//! Configuration can also be read from an INI section via
//! [`LogglyConfig::from_ini_file`].

mod file;


use std::{io, path::PathBuf, time::Duration};

use chrono::SecondsFormat;
use thiserror::Error;

/// Default collector host.
pub const DEFAULT_HOST: &str = "logs-01.loggly.com";
/// Default collector port for syslog over TLS.
pub const DEFAULT_PORT: u16 = 6514;
/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write timeout applied to socket writes.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors raised while building or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `loggly_token` was absent or blank.
    #[error("loggly_token is required and must not be empty")]
    MissingToken,
    /// A value was present but unusable.
    #[error("invalid loggly configuration: {0}")]
    InvalidConfig(String),
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid INI.
    #[error("configuration is not valid ini: {0}")]
    Ini(#[from] ini::ParseError),
}

/// Number of fractional second digits written in syslog timestamps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimePrecision {
    /// Whole seconds.
    #[default]
    Seconds,
    /// Three fractional digits.
    Millis,
    /// Six fractional digits.
    Micros,
    /// Nine fractional digits.
    Nanos,
}

impl TimePrecision {
    /// Map a digit count onto a precision. Only 0, 3, 6 and 9 are valid.
    pub fn from_digits(digits: u8) -> Result<Self, ConfigError> {
        match digits {
            0 => Ok(Self::Seconds),
            3 => Ok(Self::Millis),
            6 => Ok(Self::Micros),
            9 => Ok(Self::Nanos),
            other => Err(ConfigError::InvalidConfig(format!(
                "time_precision_digits must be one of 0, 3, 6 or 9, got {other}"
            ))),
        }
    }

    pub(crate) fn seconds_format(self) -> SecondsFormat {
        match self {
            Self::Seconds => SecondsFormat::Secs,
            Self::Millis => SecondsFormat::Millis,
            Self::Micros => SecondsFormat::Micros,
            Self::Nanos => SecondsFormat::Nanos,
        }
    }
}

/// TLS settings applied during the client handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

/// Validated forwarder configuration.
#[derive(Clone, Debug)]
pub struct LogglyConfig {
    token: String,
    tag: Option<String>,
    hostname: Option<String>,
    host: String,
    port: u16,
    discard_unannotated_pod_logs: bool,
    parse_json: bool,
    time_precision: TimePrecision,
    connect_timeout: Duration,
    write_timeout: Duration,
    tls: TlsOptions,
}

impl LogglyConfig {
    /// Start building a configuration around the default routing token.
    pub fn builder(token: impl Into<String>) -> LogglyConfigBuilder {
        LogglyConfigBuilder::new(token)
    }

    /// Default routing token for records without a token annotation.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value written as the `tag` structured-data parameter, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Syslog HOSTNAME override, if any.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` of the collector, used in diagnostics.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn discard_unannotated_pod_logs(&self) -> bool {
        self.discard_unannotated_pod_logs
    }

    pub fn parse_json(&self) -> bool {
        self.parse_json
    }

    pub fn time_precision(&self) -> TimePrecision {
        self.time_precision
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn tls(&self) -> &TlsOptions {
        &self.tls
    }
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ConfigError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for [`LogglyConfig`].
#[derive(Clone, Debug, Default)]
pub struct LogglyConfigBuilder {
    token: String,
    tag: Option<String>,
    hostname: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    discard_unannotated_pod_logs: bool,
    parse_json: bool,
    time_precision_digits: Option<u8>,
    connect_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    tls_domain: Option<String>,
    tls_insecure: bool,
}

impl LogglyConfigBuilder {
    /// Create a builder with the given default token and all other values at
    /// their defaults.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Replace the default token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Add a `tag="..."` parameter to every structured-data element.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Write `hostname` into the syslog HOSTNAME field instead of `-`.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Override the collector host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    option_setter!(
        #[doc = "Override the collector port."]
        with_port,
        port,
        u16
    );
    option_setter!(with_time_precision_digits, time_precision_digits, u8);
    option_setter!(with_connect_timeout_ms, connect_timeout_ms, u64);
    option_setter!(with_write_timeout_ms, write_timeout_ms, u64);

    /// Drop Kubernetes records that carry no token annotation.
    pub fn with_discard_unannotated_pod_logs(mut self, discard: bool) -> Self {
        self.discard_unannotated_pod_logs = discard;
        self
    }

    /// Parse the `message` field as JSON and move it under `log`.
    pub fn with_parse_json(mut self, parse_json: bool) -> Self {
        self.parse_json = parse_json;
        self
    }

    /// Configure the TLS verification name and validation policy.
    pub fn with_tls(mut self, domain: Option<String>, insecure: bool) -> Self {
        self.tls_domain = domain;
        self.tls_insecure = insecure;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if let Some(host) = &self.host
            && host.trim().is_empty()
        {
            return Err(ConfigError::InvalidConfig(
                "loggly_host must not be empty".into(),
            ));
        }
        if let Some(hostname) = &self.hostname
            && (hostname.is_empty() || hostname.contains(char::is_whitespace))
        {
            return Err(ConfigError::InvalidConfig(
                "loggly_hostname must be a single non-empty word".into(),
            ));
        }
        if let Some(port) = self.port {
            ensure_positive!(port, "loggly_port")?;
        }
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.write_timeout_ms {
            ensure_positive!(timeout, "write_timeout_ms")?;
        }
        Ok(())
    }

    /// Validate the collected values and produce a [`LogglyConfig`].
    pub fn build(&self) -> Result<LogglyConfig, ConfigError> {
        self.validate()?;
        let host = self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let time_precision = self
            .time_precision_digits
            .map(TimePrecision::from_digits)
            .transpose()?
            .unwrap_or_default();
        let domain = self
            .tls_domain
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| host.clone());
        Ok(LogglyConfig {
            token: self.token.clone(),
            tag: self.tag.clone(),
            hostname: self.hostname.clone(),
            port: self.port.unwrap_or(DEFAULT_PORT),
            discard_unannotated_pod_logs: self.discard_unannotated_pod_logs,
            parse_json: self.parse_json,
            time_precision,
            connect_timeout: self
                .connect_timeout_ms
                .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_millis),
            write_timeout: self
                .write_timeout_ms
                .map_or(DEFAULT_WRITE_TIMEOUT, Duration::from_millis),
            tls: TlsOptions {
                domain,
                insecure_skip_verify: self.tls_insecure,
            },
            host,
        })
    }
}

//! INI loading for [`LogglyConfig`].
//!
//! Keys mirror the option names used by the collector integration
//! (`loggly_token`, `loggly_port`, ...). Unknown keys are ignored with a
//! warning so a shared file can carry settings for other components.

use std::{fs, path::Path, str::FromStr};

use ini::{Ini, Properties};
use log::warn;

use super::{ConfigError, LogglyConfig, LogglyConfigBuilder};

const KNOWN_KEYS: &[&str] = &[
    "loggly_token",
    "loggly_tag",
    "loggly_hostname",
    "loggly_host",
    "loggly_port",
    "discard_unannotated_pod_logs",
    "parse_json",
    "time_precision_digits",
    "connect_timeout_ms",
    "write_timeout_ms",
    "tls_domain",
    "tls_insecure_skip_verify",
];

impl LogglyConfig {
    /// Load a configuration from `section` of the INI file at `path`.
    ///
    /// Pass `None` to read keys that appear before any section header.
    pub fn from_ini_file(
        path: impl AsRef<Path>,
        section: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini_str(&text, section)
    }

    /// Parse a configuration from INI text.
    pub fn from_ini_str(text: &str, section: Option<&str>) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        let props = ini.section(section).ok_or_else(|| match section {
            Some(name) => ConfigError::InvalidConfig(format!("section [{name}] not found")),
            None => ConfigError::MissingToken,
        })?;
        builder_from_properties(props)?.build()
    }
}

fn builder_from_properties(props: &Properties) -> Result<LogglyConfigBuilder, ConfigError> {
    for (key, _) in props.iter() {
        if !KNOWN_KEYS.contains(&key) {
            warn!("ignoring unknown loggly configuration key {key:?}");
        }
    }

    let token = props.get("loggly_token").ok_or(ConfigError::MissingToken)?;
    let mut builder = LogglyConfigBuilder::new(token)
        .with_discard_unannotated_pod_logs(
            parse_bool(props, "discard_unannotated_pod_logs")?.unwrap_or(false),
        )
        .with_parse_json(parse_bool(props, "parse_json")?.unwrap_or(false))
        .with_tls(
            props.get("tls_domain").map(str::to_owned),
            parse_bool(props, "tls_insecure_skip_verify")?.unwrap_or(false),
        );

    if let Some(tag) = props.get("loggly_tag") {
        builder = builder.with_tag(tag);
    }
    if let Some(hostname) = props.get("loggly_hostname") {
        builder = builder.with_hostname(hostname);
    }
    if let Some(host) = props.get("loggly_host") {
        builder = builder.with_host(host);
    }
    if let Some(port) = parse_number(props, "loggly_port")? {
        builder = builder.with_port(port);
    }
    if let Some(digits) = parse_number(props, "time_precision_digits")? {
        builder = builder.with_time_precision_digits(digits);
    }
    if let Some(ms) = parse_number(props, "connect_timeout_ms")? {
        builder = builder.with_connect_timeout_ms(ms);
    }
    if let Some(ms) = parse_number(props, "write_timeout_ms")? {
        builder = builder.with_write_timeout_ms(ms);
    }
    Ok(builder)
}

fn parse_bool(props: &Properties, key: &str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = props.get(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Some(true)),
        "false" | "no" | "off" | "0" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidConfig(format!(
            "{key} must be a boolean, got {raw:?}"
        ))),
    }
}

fn parse_number<T: FromStr>(props: &Properties, key: &str) -> Result<Option<T>, ConfigError> {
    props
        .get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                ConfigError::InvalidConfig(format!("{key} must be a number, got {raw:?}"))
            })
        })
        .transpose()
}

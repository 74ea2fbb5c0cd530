//! Per-record routing token selection.
//!
//! Kubernetes metadata attached by the pipeline can override the configured
//! token through pod or namespace annotations. Lookups treat any missing or
//! mistyped level of the nested structure as "not present".

use serde_json::Value;

use crate::{config::LogglyConfig, record::Record};

/// Annotation key carrying a per-pod or per-namespace token.
pub const TOKEN_ANNOTATION: &str = "solarwinds_io/loggly_token";

/// Outcome of token resolution for one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Send the record using this token.
    UseToken(String),
    /// Drop the record without sending it.
    Discard,
}

impl RoutingDecision {
    /// The token to send with, or `None` for a discard.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::UseToken(token) => Some(token),
            Self::Discard => None,
        }
    }
}

fn annotation_token<'a>(kubernetes: &'a Value, annotations: &str) -> Option<&'a str> {
    kubernetes
        .get(annotations)?
        .get(TOKEN_ANNOTATION)?
        .as_str()
        .filter(|token| !token.is_empty())
}

/// Pick the token for `record`.
///
/// Precedence: pod annotation, then namespace annotation, then discard for
/// Kubernetes records when `discard_unannotated_pod_logs` is set, and finally
/// the configured default token.
pub fn resolve(record: &Record, config: &LogglyConfig) -> RoutingDecision {
    let kubernetes = record
        .get("kubernetes")
        .filter(|value| !matches!(value, Value::Null | Value::Bool(false)));
    if let Some(k8s) = kubernetes {
        if let Some(token) = annotation_token(k8s, "annotations")
            .or_else(|| annotation_token(k8s, "namespace_annotations"))
        {
            return RoutingDecision::UseToken(token.to_owned());
        }
        if config.discard_unannotated_pod_logs() {
            return RoutingDecision::Discard;
        }
    }
    RoutingDecision::UseToken(config.token().to_owned())
}

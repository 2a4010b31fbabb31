//! Telemetry types emitted by the checks.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Tags attached to every sample a check instance emits.
pub type Tags = Vec<String>;

/// How the downstream aggregator should treat a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Rate,
    Histogram,
}

/// A single metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub name: String,
    pub value: f64,
    pub kind: MetricKind,
    #[serde(default)]
    pub tags: Tags,
}

impl MetricSample {
    pub fn new(name: &str, value: f64, kind: MetricKind, tags: &[String]) -> Self {
        Self {
            name: name.to_string(),
            value,
            kind,
            tags: tags.to_vec(),
        }
    }
}

/// A structured notification emitted on a check's failure paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEvent {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub event_type: String,
    pub msg_title: String,
    pub msg_text: String,
    /// Groups related events downstream.
    pub aggregation_key: String,
}

impl CheckEvent {
    /// Create an event stamped with the current time.
    pub fn now(event_type: &str, msg_title: String, msg_text: String, aggregation_key: &str) -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            event_type: event_type.to_string(),
            msg_title,
            msg_text,
            aggregation_key: aggregation_key.to_string(),
        }
    }
}

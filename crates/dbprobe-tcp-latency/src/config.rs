//! Instance settings for the latency check.

use dbprobe_core::{CheckError, Tags};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NETPERF_BIN: &str = "/usr/bin/netperf";
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

/// An instance as written in `tcp_roundtrip_latency_check.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TcpLatencyInstance {
    /// netserver host to measure against.
    pub host: String,
    pub port: u16,
    pub tcp_request_size_bytes: u32,
    pub tcp_response_size_bytes: u32,
    /// Seconds before netperf is killed.
    pub timeout: f64,
    pub tags: Tags,
    pub options: BTreeMap<String, serde_json::Value>,
    pub netperf_bin: String,
}

impl Default for TcpLatencyInstance {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            tcp_request_size_bytes: 0,
            tcp_response_size_bytes: 0,
            timeout: DEFAULT_TIMEOUT_SECS,
            tags: Vec::new(),
            options: BTreeMap::new(),
            netperf_bin: DEFAULT_NETPERF_BIN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TcpLatencyConfig {
    pub host: String,
    pub port: u16,
    pub request_size: u32,
    pub response_size: u32,
    pub timeout: Duration,
    /// `timeout` as configured, for messages.
    pub timeout_secs: f64,
    pub tags: Tags,
    pub options: BTreeMap<String, serde_json::Value>,
    pub netperf_bin: PathBuf,
}

impl TcpLatencyConfig {
    pub fn from_instance(instance: &TcpLatencyInstance) -> Result<Self, CheckError> {
        if instance.host.is_empty() {
            return Err(CheckError::Configuration("Netperf server host is needed.".to_string()));
        }
        if instance.port == 0 {
            return Err(CheckError::Configuration("Netperf server port is needed.".to_string()));
        }
        if instance.tcp_request_size_bytes == 0 || instance.tcp_response_size_bytes == 0 {
            return Err(CheckError::Configuration(
                "tcp_request_size_bytes and tcp_response_size_bytes must be non-zero.".to_string(),
            ));
        }
        let timeout = Duration::try_from_secs_f64(instance.timeout)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or_else(|| {
                CheckError::Configuration(format!(
                    "timeout must be a positive number of seconds, got {}",
                    instance.timeout
                ))
            })?;

        Ok(Self {
            host: instance.host.clone(),
            port: instance.port,
            request_size: instance.tcp_request_size_bytes,
            response_size: instance.tcp_response_size_bytes,
            timeout,
            timeout_secs: instance.timeout,
            tags: instance.tags.clone(),
            options: instance.options.clone(),
            netperf_bin: PathBuf::from(&instance.netperf_bin),
        })
    }
}

//! netperf invocation.
//!
//! The equivalent shell command is:
//!
//! ```text
//! /usr/bin/netperf -l 1 -H 192.168.10.10 -p 12865 -t omni -j -v 0 -P 0 -- \
//!     -d rr -o PROTOCOL,RT_LATENCY,P90_LATENCY,P99_LATENCY -r 512,256 -T TCP -b 6
//! ```
//!
//! netperf prints one CSV line without a header, with columns in the order
//! given to `-o`. [`crate::output::NetperfSample`] depends on that order.

use crate::config::TcpLatencyConfig;
use std::fmt;
use std::path::{Path, PathBuf};

pub const PROTOCOL: &str = "TCP";
pub const TEST_DURATION_SECS: u32 = 1;
pub const OUTPUT_COLUMNS: &str = "PROTOCOL,RT_LATENCY,P90_LATENCY,P99_LATENCY";
pub const BUFFER_SIZE: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetperfCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl NetperfCommand {
    pub fn new(program: &Path, host: &str, port: u16, request_size: u32, response_size: u32) -> Self {
        let args = vec![
            "-l".to_string(),
            TEST_DURATION_SECS.to_string(),
            "-H".to_string(),
            host.to_string(),
            "-p".to_string(),
            port.to_string(),
            "-t".to_string(),
            "omni".to_string(),
            "-j".to_string(),
            "-v".to_string(),
            "0".to_string(),
            "-P".to_string(),
            "0".to_string(),
            "--".to_string(),
            "-d".to_string(),
            "rr".to_string(),
            "-o".to_string(),
            OUTPUT_COLUMNS.to_string(),
            "-r".to_string(),
            format!("{},{}", request_size, response_size),
            "-T".to_string(),
            PROTOCOL.to_string(),
            "-b".to_string(),
            BUFFER_SIZE.to_string(),
        ];

        Self {
            program: program.to_path_buf(),
            args,
        }
    }

    pub fn from_config(config: &TcpLatencyConfig) -> Self {
        Self::new(
            &config.netperf_bin,
            &config.host,
            config.port,
            config.request_size,
            config.response_size,
        )
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for NetperfCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

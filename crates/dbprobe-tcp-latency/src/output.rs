//! Parsing netperf's CSV result line.

use crate::command::OUTPUT_COLUMNS;
use dbprobe_core::CheckError;
use serde::Deserialize;

/// One netperf result, in the column order of [`OUTPUT_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetperfSample {
    pub protocol: String,
    /// Mean round-trip latency in microseconds.
    pub rt_latency: f64,
    pub p90_latency: f64,
    pub p99_latency: f64,
}

impl NetperfSample {
    /// Parse the first CSV record of `output`, e.g. `TCP,667.240,785,970`.
    pub fn parse(output: &str) -> Result<Self, CheckError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(output.as_bytes());

        let record = reader
            .records()
            .next()
            .ok_or_else(|| CheckError::DataShape("netperf produced no output".to_string()))?
            .map_err(|e| CheckError::DataShape(format!("Unreadable netperf output: {}", e)))?;

        let expected = OUTPUT_COLUMNS.split(',').count();
        if record.len() != expected {
            return Err(CheckError::DataShape(format!(
                "Expected {} netperf columns ({}), got {}: {:?}",
                expected,
                OUTPUT_COLUMNS,
                record.len(),
                output.trim()
            )));
        }

        record
            .deserialize(None)
            .map_err(|e| CheckError::DataShape(format!("Invalid netperf output {:?}: {}", output.trim(), e)))
    }
}

//! dbprobe TCP roundtrip latency check - measures request/response latency to
//! a remote host with netperf.
//!
//! Command failures and timeouts are reported as events and never abort the
//! invocation. Invalid instance settings still do.

pub mod check;
pub mod command;
pub mod config;
pub mod events;
pub mod exec;
pub mod output;

pub use check::TcpLatencyCheck;
pub use config::{TcpLatencyConfig, TcpLatencyInstance};
pub use exec::{run_with_deadline, CommandOutcome};
pub use output::NetperfSample;

//! dbprobe core - shared types and plumbing for the dbprobe agent checks.

pub mod check;
pub mod config;
pub mod error;
pub mod sink;
pub mod tracing_setup;
pub mod types;

pub use check::Check;
pub use config::{load_instances, InstancesFile};
pub use error::CheckError;
pub use sink::{Collector, MetricSink};
pub use types::{CheckEvent, MetricKind, MetricSample, Tags};

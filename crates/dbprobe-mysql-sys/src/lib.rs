//! dbprobe MySQL sys check - reports statement latency percentiles from the
//! MySQL `sys` schema.
//!
//! The check refuses to run against servers older than 5.6.5 (the statement
//! digest tables appeared in that release) or servers without the `sys`
//! schema installed. Every failure past configuration is returned to the
//! caller; this check never emits events.

pub mod check;
pub mod config;
pub mod schema;
pub mod version;

pub use check::MySqlSysCheck;
pub use config::{ConnectStrategy, MySqlSysConfig, MySqlSysInstance};
pub use schema::{Connector, MySqlConnector, SysSchema};
pub use version::{MySqlVersion, VersionParseError};

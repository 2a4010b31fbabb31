//! The MySQL sys check.

use crate::config::{MySqlSysConfig, MySqlSysInstance};
use crate::schema::{Connector, MySqlConnector, SysSchema};
use crate::version::{MySqlVersion, DIGEST_TABLES_VERSION};
use dbprobe_core::{Check, CheckError, MetricKind, MetricSink};
use std::collections::HashMap;
use tracing::{debug, info};

const DIGEST_95TH_PERCENTILE_KEY: &str = "Ps_digest_95th_percentile_by_avg_us";

/// Result key, metric name, metric kind.
const METRICS: &[(&str, &str, MetricKind)] = &[(
    DIGEST_95TH_PERCENTILE_KEY,
    "mysql.sys.query_exec_time_95th_per_us",
    MetricKind::Gauge,
)];

const SYS_SCHEMA_MISSING: &str = "The mysql_sys utility is not installed. Please visit \
    https://github.com/MarkLeith/mysql-sys for installation instructions";

pub struct MySqlSysCheck<C = MySqlConnector> {
    connector: C,
}

impl MySqlSysCheck<MySqlConnector> {
    pub fn new() -> Self {
        Self {
            connector: MySqlConnector,
        }
    }
}

impl Default for MySqlSysCheck<MySqlConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> MySqlSysCheck<C> {
    pub fn with_connector(connector: C) -> Self {
        Self { connector }
    }

    /// True only when the server reports a version newer than 5.6.5.
    ///
    /// A version that cannot be read or parsed counts as too old; the
    /// problem is reported through the sink as a warning.
    fn version_gate(&self, session: &mut C::Session, sink: &mut dyn MetricSink) -> bool {
        let parsed = session.server_version().and_then(|raw| {
            debug!("MySQL version {}", raw);
            raw.parse::<MySqlVersion>()
                .map_err(|e| CheckError::DataShape(e.to_string()))
        });

        match parsed {
            Ok(version) => version.has_digest_tables(),
            Err(e) => {
                sink.warning(format!(
                    "Cannot compute mysql version, assuming older than {}: {}",
                    DIGEST_TABLES_VERSION, e
                ));
                false
            }
        }
    }

    fn sys_schema_installed(&self, session: &mut C::Session) -> Result<bool, CheckError> {
        Ok(session.sys_version_rows()? > 0)
    }

    /// Fetches the 95th percentile statement latency in microseconds.
    fn query_exec_time_95th_per_us(&self, session: &mut C::Session) -> Result<f64, CheckError> {
        let values = session.percentile_values()?;
        match values.as_slice() {
            [value] => Ok(*value),
            _ => Err(CheckError::DataShape(format!(
                "Failed to fetch record from the table x$ps_digest_95th_percentile_by_avg_us \
                 (expected 1 row, got {})",
                values.len()
            ))),
        }
    }

    fn collect_metrics(
        &self,
        session: &mut C::Session,
        config: &MySqlSysConfig,
        sink: &mut dyn MetricSink,
    ) -> Result<(), CheckError> {
        let mut results = HashMap::new();
        results.insert(DIGEST_95TH_PERCENTILE_KEY, self.query_exec_time_95th_per_us(session)?);

        for (key, name, kind) in METRICS {
            let Some(value) = results.get(key).copied() else {
                debug!("{} returned None", key);
                continue;
            };
            info!("{} {} = {} (host {})", kind_label(*kind), name, value, config.host);
            match kind {
                MetricKind::Gauge => sink.gauge(name, value, &config.tags),
                MetricKind::Rate => sink.rate(name, value, &config.tags),
                MetricKind::Histogram => sink.histogram(name, value, &config.tags),
            }
        }

        Ok(())
    }
}

fn kind_label(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Gauge => "gauge",
        MetricKind::Rate => "rate",
        MetricKind::Histogram => "histogram",
    }
}

impl<C: Connector> Check for MySqlSysCheck<C> {
    type Instance = MySqlSysInstance;

    const NAME: &'static str = "mysql_sys";

    fn check(&self, instance: &MySqlSysInstance, sink: &mut dyn MetricSink) -> Result<(), CheckError> {
        let config = MySqlSysConfig::from_instance(instance)?;

        let mut session = self.connector.connect(&config.strategy)?;

        if !self.version_gate(&mut session, sink) {
            return Err(CheckError::Eligibility(format!(
                "MySQL version > {} is required.",
                DIGEST_TABLES_VERSION
            )));
        }

        if !self.sys_schema_installed(&mut session)? {
            return Err(CheckError::Eligibility(SYS_SCHEMA_MISSING.to_string()));
        }

        self.collect_metrics(&mut session, &config, sink)
    }
}

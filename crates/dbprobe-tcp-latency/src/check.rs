//! The TCP roundtrip latency check.

use crate::command::NetperfCommand;
use crate::config::{TcpLatencyConfig, TcpLatencyInstance};
use crate::events::{aggregation_key, error_event, timeout_event};
use crate::exec::{run_with_deadline, CommandOutcome};
use crate::output::NetperfSample;
use dbprobe_core::{Check, CheckError, MetricSink};
use tracing::{debug, error, info, warn};

pub const RT_LATENCY_METRIC: &str = "mysql.net.tcp_rt_latency";

#[derive(Debug, Clone, Copy, Default)]
pub struct TcpLatencyCheck;

impl TcpLatencyCheck {
    pub fn new() -> Self {
        Self
    }

    fn collect_metrics(
        &self,
        config: &TcpLatencyConfig,
        aggregation_key: &str,
        sink: &mut dyn MetricSink,
    ) -> Result<(), CheckError> {
        let command = NetperfCommand::from_config(config);
        debug!("Running {}", command);

        let output = match run_with_deadline(command.program(), command.args(), config.timeout) {
            CommandOutcome::Completed(output) => output,
            CommandOutcome::Failed(message) => {
                error!("netperf against {} failed: {}", config.host, message);
                sink.event(error_event(&config.host, &message, aggregation_key));
                return Ok(());
            }
            CommandOutcome::TimedOut => {
                warn!("netperf against {} timed out after {:?}", config.host, config.timeout);
                sink.event(timeout_event(&config.host, config.timeout_secs, aggregation_key));
                return Ok(());
            }
        };

        // p90/p99 are parsed but not reported.
        let sample = NetperfSample::parse(&output)?;
        info!(
            "Server {}:{} - {} RT latency: {}us",
            config.host, config.port, sample.protocol, sample.rt_latency
        );
        sink.histogram(RT_LATENCY_METRIC, sample.rt_latency, &config.tags);

        Ok(())
    }
}

impl Check for TcpLatencyCheck {
    type Instance = TcpLatencyInstance;

    const NAME: &'static str = "tcp_roundtrip_latency_check";

    fn check(&self, instance: &TcpLatencyInstance, sink: &mut dyn MetricSink) -> Result<(), CheckError> {
        let config = TcpLatencyConfig::from_instance(instance)?;
        let aggregation_key = aggregation_key(&config.host);
        self.collect_metrics(&config, &aggregation_key, sink)
    }
}

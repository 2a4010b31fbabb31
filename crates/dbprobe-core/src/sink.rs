//! Emission capability handed to every check invocation.

use crate::types::{CheckEvent, MetricKind, MetricSample};
use tracing::{debug, warn};

/// Destination for everything a check emits.
///
/// Checks receive this as `&mut dyn MetricSink`; the host runtime decides
/// where samples and events end up.
pub trait MetricSink {
    fn submit(&mut self, sample: MetricSample);

    fn event(&mut self, event: CheckEvent);

    /// Record a non-fatal problem with the current invocation.
    fn warning(&mut self, message: String);

    fn gauge(&mut self, name: &str, value: f64, tags: &[String]) {
        self.submit(MetricSample::new(name, value, MetricKind::Gauge, tags));
    }

    fn rate(&mut self, name: &str, value: f64, tags: &[String]) {
        self.submit(MetricSample::new(name, value, MetricKind::Rate, tags));
    }

    fn histogram(&mut self, name: &str, value: f64, tags: &[String]) {
        self.submit(MetricSample::new(name, value, MetricKind::Histogram, tags));
    }
}

/// A sink that keeps everything in memory until it is drained.
#[derive(Debug, Default)]
pub struct Collector {
    metrics: Vec<MetricSample>,
    events: Vec<CheckEvent>,
    warnings: Vec<String>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &[MetricSample] {
        &self.metrics
    }

    pub fn events(&self) -> &[CheckEvent] {
        &self.events
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Drain recorded samples.
    pub fn take_metrics(&mut self) -> Vec<MetricSample> {
        std::mem::take(&mut self.metrics)
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<CheckEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain recorded warnings.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

impl MetricSink for Collector {
    fn submit(&mut self, sample: MetricSample) {
        debug!("Recorded {:?} {} = {}", sample.kind, sample.name, sample.value);
        self.metrics.push(sample);
    }

    fn event(&mut self, event: CheckEvent) {
        debug!("Recorded event: {}", event.msg_title);
        self.events.push(event);
    }

    fn warning(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

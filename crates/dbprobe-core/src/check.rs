//! The contract every check implements.

use crate::error::CheckError;
use crate::sink::MetricSink;
use serde::de::DeserializeOwned;

/// A stateless, synchronous unit of data acquisition and emission.
///
/// The host runtime calls [`Check::check`] once per scheduled run with a
/// freshly deserialized instance. Nothing may be carried between calls.
pub trait Check {
    /// Per-instance settings as they appear in the instance file.
    type Instance: DeserializeOwned;

    /// Name used for logging and default configuration paths.
    const NAME: &'static str;

    fn check(&self, instance: &Self::Instance, sink: &mut dyn MetricSink) -> Result<(), CheckError>;
}

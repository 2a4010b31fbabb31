//! Events emitted when netperf cannot produce a measurement.

use dbprobe_core::CheckEvent;
use md5::{Digest, Md5};

pub const EVENT_TYPE: &str = "mysql_tcp_rt_latency_check";

/// Hex MD5 of the host, used to group events for the same target.
pub fn aggregation_key(host: &str) -> String {
    hex::encode(Md5::digest(host.as_bytes()))
}

/// `timeout_secs` is the configured value; it renders as e.g. `5.0`.
pub fn timeout_event(host: &str, timeout_secs: f64, aggregation_key: &str) -> CheckEvent {
    CheckEvent::now(
        EVENT_TYPE,
        format!("MySQL host {} to remote host RT latency timeout", host),
        format!(
            "TCP connection attempt to {} timed out after {:?} seconds.",
            host, timeout_secs
        ),
        aggregation_key,
    )
}

pub fn error_event(host: &str, error_msg: &str, aggregation_key: &str) -> CheckEvent {
    CheckEvent::now(
        EVENT_TYPE,
        format!(
            "MySQL host {} to remote host RT latency command returned invalid code",
            host
        ),
        error_msg.to_string(),
        aggregation_key,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_key_is_md5_hex() {
        assert_eq!(aggregation_key(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(aggregation_key("127.0.0.1"), "f528764d624db129b32c21fbca0cb8d6");
        assert_eq!(aggregation_key("a"), aggregation_key("a"));
    }

    #[test]
    fn test_timeout_event_text() {
        let event = timeout_event("db1", 1.5, "k");
        assert_eq!(event.event_type, EVENT_TYPE);
        assert!(event.msg_title.contains("db1"));
        assert_eq!(event.msg_text, "TCP connection attempt to db1 timed out after 1.5 seconds.");

        let event = timeout_event("db1", 5.0, "k");
        assert_eq!(event.msg_text, "TCP connection attempt to db1 timed out after 5.0 seconds.");
    }

    #[test]
    fn test_error_event_carries_message() {
        let event = error_event("db1", "Command '/usr/bin/netperf' failed", "k");
        assert_eq!(event.msg_text, "Command '/usr/bin/netperf' failed");
        assert_eq!(event.aggregation_key, "k");
    }
}

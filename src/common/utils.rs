//! Utility functions for replog

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parse duration string (e.g., "250ms", "30s", "5m", "1h")
pub fn parse_duration(s: &str) -> crate::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(crate::Error::InvalidConfig("empty duration".into()));
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else {
        let split = s.len() - s.chars().last().map(char::len_utf8).unwrap_or(0);
        (&s[..split], &s[split..])
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| crate::Error::InvalidConfig(format!("invalid duration: {}", s)))?;

    let duration = match unit {
        "ms" => Duration::from_millis(num),
        "s" => Duration::from_secs(num),
        "m" => Duration::from_secs(num * 60),
        "h" => Duration::from_secs(num * 3600),
        _ => {
            return Err(crate::Error::InvalidConfig(format!(
                "unknown duration unit: {}",
                unit
            )))
        }
    };

    Ok(duration)
}

/// Delay before the attempt following `attempt` (0-based): `base^attempt` units.
pub fn backoff_delay(base: u32, attempt: u32, unit: Duration) -> Duration {
    let factor = base.saturating_pow(attempt);
    unit.saturating_mul(factor)
}

/// Strip trailing slashes so `http://r1:5001/` and `http://r1:5001` name the same replica
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Replica health as seen by the coordinator's heartbeat sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplicaHealth {
    /// Last probe answered with a success status
    Healthy,
    /// Last probe got an answer, but not a success status
    Suspected,
    /// Last probe timed out or could not connect
    Unhealthy,
}

impl ReplicaHealth {
    /// Can this replica receive new writes?
    pub fn is_healthy(&self) -> bool {
        matches!(self, ReplicaHealth::Healthy)
    }
}

impl std::fmt::Display for ReplicaHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplicaHealth::Healthy => write!(f, "Healthy"),
            ReplicaHealth::Suspected => write!(f, "Suspected"),
            ReplicaHealth::Unhealthy => write!(f, "Unhealthy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[test]
    fn test_backoff_delay() {
        let unit = Duration::from_secs(1);
        assert_eq!(backoff_delay(3, 0, unit), Duration::from_secs(1));
        assert_eq!(backoff_delay(3, 1, unit), Duration::from_secs(3));
        assert_eq!(backoff_delay(3, 2, unit), Duration::from_secs(9));
        assert_eq!(backoff_delay(3, 5, unit), Duration::from_secs(243));
        // No overflow panic on silly configs
        assert_eq!(backoff_delay(u32::MAX, 8, unit), unit.saturating_mul(u32::MAX));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("http://r1:5001/"), "http://r1:5001");
        assert_eq!(normalize_url(" http://r1:5001 "), "http://r1:5001");
    }

    #[test]
    fn test_replica_health() {
        assert!(ReplicaHealth::Healthy.is_healthy());
        assert!(!ReplicaHealth::Suspected.is_healthy());
        assert!(!ReplicaHealth::Unhealthy.is_healthy());
        assert_eq!(
            serde_json::to_string(&ReplicaHealth::Suspected).unwrap(),
            "\"Suspected\""
        );
    }
}

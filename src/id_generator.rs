use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// `yyyyMMddHHmmssSSS`, always 17 digits.
const BASE_FORMAT: &str = "%Y%m%d%H%M%S%3f";

pub trait IdGenerator: Send + Sync {
    /// Returns a fresh 17-digit time-based base.
    fn next_base(&self) -> String;
}

/// Appends the zero-padded sequence suffix to a base id.
pub fn record_id(base: &str, sequence: usize) -> String {
    format!("{}_{:02}", base, sequence)
}

/// Clock-backed generator. Bases are strictly increasing within one process: two calls in the
/// same millisecond get consecutive milliseconds.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = truncate_to_millis(now);
        let next = match *last {
            Some(previous) if now <= previous => previous + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn next_base(&self) -> String {
        self.next_instant(Utc::now()).format(BASE_FORMAT).to_string()
    }
}

fn truncate_to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::{record_id, IdGenerator, TimestampIdGenerator};
    use chrono::{TimeZone, Utc};

    #[test]
    fn base_is_seventeen_digits() {
        let base = TimestampIdGenerator::new().next_base();
        assert_eq!(base.len(), 17);
        assert!(base.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn same_millisecond_bumps_forward() {
        let generator = TimestampIdGenerator::new();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 23, 59, 59).single().expect("valid timestamp")
            + chrono::Duration::milliseconds(999);
        let first = generator.next_instant(now);
        let second = generator.next_instant(now);
        assert_eq!(first.format(super::BASE_FORMAT).to_string(), "20261019235959999");
        assert_eq!(second.format(super::BASE_FORMAT).to_string(), "20261020000000000");
    }

    #[test]
    fn record_id_pads_sequence() {
        assert_eq!(record_id("20261019120000000", 1), "20261019120000000_01");
        assert_eq!(record_id("20261019120000000", 10), "20261019120000000_10");
    }
}

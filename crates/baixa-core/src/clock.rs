use chrono::{DateTime, Duration, Utc};

/// Source of the completion timestamp.
pub trait Clock {
    fn now_utc(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Brasília wall-clock time (UTC-3, no DST) as `YYYY-MM-DD HH:MM:SS`.
pub fn brasilia_timestamp(now: DateTime<Utc>) -> String {
    (now - Duration::hours(3))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

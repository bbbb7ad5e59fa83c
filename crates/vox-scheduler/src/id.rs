//! Job id generation.

use chrono::{NaiveDateTime, Timelike, Utc};
use std::sync::Mutex;

/// Source of job ids (swap in a fixed sequence for deterministic tests).
pub trait IdProvider: Send + Sync {
    fn next_id(&self) -> String;
}

const ID_FORMAT: &str = "%Y%m%d%H%M%S%6f";

/// 20-digit UTC timestamp ids (`YYYYmmddHHMMSSffffff`), strictly increasing per process.
///
/// When the clock has not moved past the last issued microsecond (burst of
/// submissions, clock step backwards) the last value plus one microsecond is used.
pub struct TimestampIdGenerator {
    last: Mutex<Option<NaiveDateTime>>,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    fn next_at(&self, now: NaiveDateTime) -> String {
        let now = now
            .with_nanosecond(now.nanosecond() / 1_000 * 1_000)
            .unwrap_or(now);
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let issued = match *last {
            Some(prev) if now <= prev => prev + chrono::Duration::microseconds(1),
            _ => now,
        };
        *last = Some(issued);
        issued.format(ID_FORMAT).to_string()
    }
}

impl Default for TimestampIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdProvider for TimestampIdGenerator {
    fn next_id(&self) -> String {
        self.next_at(Utc::now().naive_utc())
    }
}

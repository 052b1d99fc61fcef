use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Produces `<PREFIX>yyyyMMddHHmmssfff` codes.
///
/// Two calls in the same millisecond would collide, so the generator never
/// hands out the same millisecond twice within a process: a repeat is
/// pushed to the next free millisecond.
#[derive(Debug)]
pub struct CodeGenerator {
    prefix: &'static str,
    last_millis: AtomicI64,
}

impl CodeGenerator {
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            last_millis: AtomicI64::new(i64::MIN),
        }
    }

    pub fn next(&self, now: DateTime<Utc>) -> String {
        let wanted = now.timestamp_millis();
        let mut previous = self.last_millis.load(Ordering::Relaxed);
        let millis = loop {
            let candidate = wanted.max(previous.saturating_add(1));
            match self.last_millis.compare_exchange_weak(
                previous,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break candidate,
                Err(actual) => previous = actual,
            }
        };

        let stamp = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(now);
        format!("{}{}", self.prefix, stamp.format("%Y%m%d%H%M%S%3f"))
    }
}

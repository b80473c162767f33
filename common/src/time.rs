use chrono::{DateTime, NaiveDate, Utc};

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// UTC calendar day a millisecond timestamp falls on.
pub fn utc_day(ts_ms: u64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(ts_ms as i64)
        .unwrap_or_default()
        .date_naive()
}

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

pub(crate) fn get_duration_since_epoch() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

/// return millisecond
pub(crate) fn timestamp_millis() -> u64 {
    u64::try_from(get_duration_since_epoch().as_millis()).unwrap_or(u64::MAX)
}

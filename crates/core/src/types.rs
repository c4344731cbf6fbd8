/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monotonic identifier of a render job within one process session.
pub type JobId = u64;

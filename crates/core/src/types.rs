/// Wall-clock timestamp used for session bookkeeping.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Joint angle in degrees.
pub type Degrees = f64;

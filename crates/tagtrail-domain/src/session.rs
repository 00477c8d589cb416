use chrono::{DateTime, Utc};

/// Deduplicated per-device session summary, the alternate ingestion shape used
/// by gateways that aggregate detections locally before reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSession {
    pub hashed_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub rssi_min: i32,
    pub rssi_max: i32,
    pub rssi_variance: f64,
    pub detections: u64,
}

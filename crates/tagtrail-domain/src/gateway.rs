use chrono::{DateTime, Utc};

/// Gateway-level aggregate telemetry carried alongside (or instead of) per-tag
/// observations in an ingest batch. Updates the gateway heartbeat and records
/// one unique-device count sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayTelemetry {
    pub gateway_id: String,
    pub timestamp: DateTime<Utc>,
    pub unique_devices: u64,
}

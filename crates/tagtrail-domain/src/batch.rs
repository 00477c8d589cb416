use chrono::{DateTime, Utc};

use crate::gateway::GatewayTelemetry;
use crate::session::DeviceSession;
use crate::tag::TagObservation;

/// One tag sighting inside an asset-tracking report; position comes from the
/// reporting gateway, not the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPing {
    pub id: String,
    pub rssi: i32,
}

/// Per-batch asset-tracking section: every listed tag shares the gateway's
/// timestamp and position.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetTrackingReport {
    pub gateway_id: String,
    pub ts: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub tags: Vec<TagPing>,
}

impl AssetTrackingReport {
    /// Fans the gateway-level report out into one observation per tag.
    pub fn into_observations(self) -> Vec<TagObservation> {
        let AssetTrackingReport {
            gateway_id,
            ts,
            lat,
            lng,
            tags,
        } = self;
        tags.into_iter()
            .map(|ping| TagObservation {
                tag_id: ping.id,
                gateway_id: gateway_id.clone(),
                ts,
                lat,
                lng,
                rssi: ping.rssi,
            })
            .collect()
    }
}

/// One inbound gateway batch, already authenticated and parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestBatch {
    /// Sectioned report: optional aggregate telemetry plus optional per-tag
    /// observations.
    Report {
        telemetry: Option<GatewayTelemetry>,
        asset_tracking: Option<AssetTrackingReport>,
    },
    /// Flat list of deduplicated device session summaries.
    Sessions(Vec<DeviceSession>),
}

/// Aggregate outcome of one ingest batch. Per-tag failures are isolated, so a
/// batch can partially succeed; the counts tell the gateway what landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub telemetry_recorded: bool,
    pub tags_recorded: usize,
    pub tags_failed: usize,
    pub sessions_recorded: usize,
}

//! Wire types for the HTTP surface, converted to and from domain types at the
//! transport boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tagtrail_domain::{
    ActiveTag, AssetTrackingReport, DeviceSession, GatewayTelemetry, IngestBatch, IngestReport,
    TagPing,
};

/// Ingest body: either a sectioned gateway report or a flat array of
/// deduplicated per-device session summaries.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IngestRequest {
    Sessions(Vec<DeviceSessionRecord>),
    Report(ReportSections),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSections {
    #[serde(default)]
    pub telemetry: Option<TelemetrySection>,
    #[serde(default)]
    pub asset_tracking: Option<AssetTrackingSection>,
}

#[derive(Debug, Deserialize)]
pub struct TelemetrySection {
    pub gateway_id: String,
    pub timestamp: DateTime<Utc>,
    pub unique_devices: u64,
}

#[derive(Debug, Deserialize)]
pub struct AssetTrackingSection {
    pub gateway_id: String,
    pub ts: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub tags: Vec<TagPingDto>,
}

#[derive(Debug, Deserialize)]
pub struct TagPingDto {
    pub id: String,
    pub rssi: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSessionRecord {
    pub hashed_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub rssi_min: i32,
    pub rssi_max: i32,
    #[serde(default)]
    pub rssi_variance: f64,
    pub detections: u64,
}

impl From<IngestRequest> for IngestBatch {
    fn from(request: IngestRequest) -> Self {
        match request {
            IngestRequest::Sessions(records) => {
                IngestBatch::Sessions(records.into_iter().map(Into::into).collect())
            }
            IngestRequest::Report(sections) => IngestBatch::Report {
                telemetry: sections.telemetry.map(Into::into),
                asset_tracking: sections.asset_tracking.map(Into::into),
            },
        }
    }
}

impl From<TelemetrySection> for GatewayTelemetry {
    fn from(section: TelemetrySection) -> Self {
        GatewayTelemetry {
            gateway_id: section.gateway_id,
            timestamp: section.timestamp,
            unique_devices: section.unique_devices,
        }
    }
}

impl From<AssetTrackingSection> for AssetTrackingReport {
    fn from(section: AssetTrackingSection) -> Self {
        AssetTrackingReport {
            gateway_id: section.gateway_id,
            ts: section.ts,
            lat: section.lat,
            lng: section.lng,
            tags: section
                .tags
                .into_iter()
                .map(|tag| TagPing {
                    id: tag.id,
                    rssi: tag.rssi,
                })
                .collect(),
        }
    }
}

impl From<DeviceSessionRecord> for DeviceSession {
    fn from(record: DeviceSessionRecord) -> Self {
        DeviceSession {
            hashed_id: record.hashed_id,
            first_seen: record.first_seen,
            last_seen: record.last_seen,
            rssi_min: record.rssi_min,
            rssi_max: record.rssi_max,
            rssi_variance: record.rssi_variance,
            detections: record.detections,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub telemetry_recorded: bool,
    pub tags_recorded: usize,
    pub tags_failed: usize,
    pub sessions_recorded: usize,
}

impl From<IngestReport> for IngestResponse {
    fn from(report: IngestReport) -> Self {
        IngestResponse {
            success: true,
            telemetry_recorded: report.telemetry_recorded,
            tags_recorded: report.tags_recorded,
            tags_failed: report.tags_failed,
            sessions_recorded: report.sessions_recorded,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TagListResponse {
    pub tags: Vec<TagDto>,
}

#[derive(Debug, Serialize)]
pub struct TagDto {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub rssi: i32,
    pub gateway_id: String,
    pub ts: DateTime<Utc>,
}

impl From<ActiveTag> for TagDto {
    fn from(tag: ActiveTag) -> Self {
        TagDto {
            id: tag.tag_id,
            lat: tag.state.lat,
            lng: tag.state.lng,
            rssi: tag.state.rssi,
            gateway_id: tag.state.gateway_id,
            ts: tag.state.ts,
        }
    }
}

/// GeoJSON LineString: coordinates are (lng, lat) pairs in insertion order.
#[derive(Debug, Serialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: Vec<[f64; 2]>,
}

impl LineString {
    pub fn from_trail(trail: Vec<(f64, f64)>) -> Self {
        LineString {
            kind: "LineString",
            coordinates: trail.into_iter().map(|(lng, lat)| [lng, lat]).collect(),
        }
    }
}

use chrono::{DateTime, Utc};

/// Most recent known position/signal snapshot for a tag.
///
/// Expires automatically 130 seconds after the last accepted observation, with
/// no renewal beyond the next one; an absent state means the tag was never
/// seen or has dropped off.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveState {
    pub lat: f64,
    pub lng: f64,
    pub rssi: i32,
    pub gateway_id: String,
    pub ts: DateTime<Utc>,
}

/// One retained observation in a tag's history log, ordered by store-assigned
/// insertion position.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub gateway_id: String,
    pub ts: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub rssi: i32,
}

/// A single (tag, gateway, timestamp, position, signal) tuple as produced by
/// the ingestion coordinator. The position is gateway-local: every tag seen by
/// one gateway in one batch inherits that gateway's coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TagObservation {
    pub tag_id: String,
    pub gateway_id: String,
    pub ts: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub rssi: i32,
}

impl TagObservation {
    pub fn live_state(&self) -> LiveState {
        LiveState {
            lat: self.lat,
            lng: self.lng,
            rssi: self.rssi,
            gateway_id: self.gateway_id.clone(),
            ts: self.ts,
        }
    }

    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            gateway_id: self.gateway_id.clone(),
            ts: self.ts,
            lat: self.lat,
            lng: self.lng,
            rssi: self.rssi,
        }
    }
}

/// A tag with a non-expired live state, as returned by the query service.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTag {
    pub tag_id: String,
    pub state: LiveState,
}

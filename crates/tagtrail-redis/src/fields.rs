//! Field encoding shared by the live-state hash and the history stream. Both
//! store the same five observation fields as flat string pairs.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tagtrail_domain::{HistoryEntry, LiveState};

pub(crate) const FIELD_LAT: &str = "lat";
pub(crate) const FIELD_LNG: &str = "lng";
pub(crate) const FIELD_RSSI: &str = "rssi";
pub(crate) const FIELD_GATEWAY_ID: &str = "gateway_id";
pub(crate) const FIELD_TS: &str = "ts";

pub(crate) fn live_state_fields(state: &LiveState) -> [(&'static str, String); 5] {
    observation_fields(
        state.lat,
        state.lng,
        state.rssi,
        &state.gateway_id,
        state.ts,
    )
}

pub(crate) fn history_entry_fields(entry: &HistoryEntry) -> [(&'static str, String); 5] {
    observation_fields(
        entry.lat,
        entry.lng,
        entry.rssi,
        &entry.gateway_id,
        entry.ts,
    )
}

fn observation_fields(
    lat: f64,
    lng: f64,
    rssi: i32,
    gateway_id: &str,
    ts: DateTime<Utc>,
) -> [(&'static str, String); 5] {
    [
        (FIELD_LAT, lat.to_string()),
        (FIELD_LNG, lng.to_string()),
        (FIELD_RSSI, rssi.to_string()),
        (FIELD_GATEWAY_ID, gateway_id.to_string()),
        (FIELD_TS, ts.to_rfc3339()),
    ]
}

/// Parses a live-state hash. `None` on a missing or torn record (any required
/// field absent or unparseable) so callers never see a partial state.
pub(crate) fn parse_live_state(map: &HashMap<String, String>) -> Option<LiveState> {
    let lat: f64 = map.get(FIELD_LAT)?.parse().ok()?;
    let lng: f64 = map.get(FIELD_LNG)?.parse().ok()?;
    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }
    let rssi: i32 = map.get(FIELD_RSSI)?.parse().ok()?;
    let gateway_id = map.get(FIELD_GATEWAY_ID)?.clone();
    let ts = parse_ts(map.get(FIELD_TS)?)?;
    Some(LiveState {
        lat,
        lng,
        rssi,
        gateway_id,
        ts,
    })
}

pub(crate) fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

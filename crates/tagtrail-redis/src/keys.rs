//! Redis key layout. Preserved for compatibility with existing deployments;
//! changing any of these formats orphans live data.

pub const LIVE_STATE_KEY_PATTERN: &str = "tag:latest:*";

pub fn live_state_key(tag_id: &str) -> String {
    format!("tag:latest:{tag_id}")
}

pub fn history_key(tag_id: &str) -> String {
    format!("tag:history:{tag_id}")
}

pub fn heartbeat_key(gateway_id: &str) -> String {
    format!("gateway_id:{gateway_id}:heartbeat")
}

pub fn traffic_key(gateway_id: &str, unix_time: i64) -> String {
    format!("gateway_id:{gateway_id}:traffic:{unix_time}")
}

pub fn device_trail_key(hashed_id: &str) -> String {
    format!("device:{hashed_id}:trail")
}

pub fn tag_id_from_live_key(key: &str) -> Option<&str> {
    key.strip_prefix("tag:latest:")
}

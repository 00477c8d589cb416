use async_trait::async_trait;
use tagtrail_domain::{DeviceSession, DeviceSessionRepository, DomainError, DomainResult};
use tracing::debug;

use crate::client::RedisClient;
use crate::gateway_telemetry_repository::TRAFFIC_TTL_SECS;
use crate::keys;

/// Redis implementation of [`DeviceSessionRepository`]: per device, a sorted
/// set of JSON session summaries at `device:{hashedId}:trail`, scored by
/// last-seen time and expiring after 14 days.
#[derive(Clone)]
pub struct RedisDeviceSessionRepository {
    client: RedisClient,
}

impl RedisDeviceSessionRepository {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

fn session_member(session: &DeviceSession) -> String {
    serde_json::json!({
        "hashed_id": session.hashed_id,
        "first_seen": session.first_seen.to_rfc3339(),
        "last_seen": session.last_seen.to_rfc3339(),
        "rssi_min": session.rssi_min,
        "rssi_max": session.rssi_max,
        "rssi_variance": session.rssi_variance,
        "detections": session.detections,
    })
    .to_string()
}

#[async_trait]
impl DeviceSessionRepository for RedisDeviceSessionRepository {
    async fn record_sessions(&self, sessions: Vec<DeviceSession>) -> DomainResult<usize> {
        let mut conn = self.client.connection();
        let mut recorded = 0usize;

        for session in &sessions {
            let key = keys::device_trail_key(&session.hashed_id);
            let score = session.last_seen.timestamp();

            let mut pipe = redis::pipe();
            pipe.atomic()
                .zadd(&key, session_member(session), score)
                .ignore()
                .expire(&key, TRAFFIC_TTL_SECS)
                .ignore();
            pipe.query_async::<()>(&mut conn)
                .await
                .map_err(|e| DomainError::StoreError(e.into()))?;
            recorded += 1;
        }

        debug!(session_count = recorded, "recorded device sessions");
        Ok(recorded)
    }
}

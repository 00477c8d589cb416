use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use tagtrail_domain::{DomainError, DomainResult, GatewayTelemetry, GatewayTelemetryRepository};
use tracing::debug;

use crate::client::RedisClient;
use crate::keys;

/// Traffic and session keys age out after two weeks.
pub const TRAFFIC_TTL_SECS: i64 = 14 * 24 * 60 * 60;

/// Redis implementation of [`GatewayTelemetryRepository`]: a plain string
/// heartbeat per gateway plus one sorted set of JSON count samples per
/// gateway+time bucket, each with an independent 14-day expiry.
#[derive(Clone)]
pub struct RedisGatewayTelemetryRepository {
    client: RedisClient,
}

impl RedisGatewayTelemetryRepository {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GatewayTelemetryRepository for RedisGatewayTelemetryRepository {
    async fn record_heartbeat(&self, gateway_id: &str, ts: DateTime<Utc>) -> DomainResult<()> {
        let key = keys::heartbeat_key(gateway_id);
        let mut conn = self.client.connection();

        let _: () = conn
            .set(&key, ts.to_rfc3339())
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;
        debug!(gateway_id = %gateway_id, "refreshed gateway heartbeat");
        Ok(())
    }

    async fn record_traffic_sample(&self, sample: GatewayTelemetry) -> DomainResult<()> {
        let unix_time = sample.timestamp.timestamp();
        let key = keys::traffic_key(&sample.gateway_id, unix_time);
        let member = serde_json::json!({
            "ts": sample.timestamp.to_rfc3339(),
            "unique_devices": sample.unique_devices,
        })
        .to_string();

        let mut conn = self.client.connection();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .zadd(&key, member, unix_time)
            .ignore()
            .expire(&key, TRAFFIC_TTL_SECS)
            .ignore();
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;
        debug!(
            gateway_id = %sample.gateway_id,
            unique_devices = sample.unique_devices,
            "recorded traffic sample"
        );
        Ok(())
    }
}

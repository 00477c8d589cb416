use async_trait::async_trait;
use redis::streams::{StreamId, StreamMaxlen, StreamRangeReply};
use redis::AsyncCommands;
use tagtrail_domain::{
    DomainError, DomainResult, HistoryEntry, TagHistoryRepository, TrimStrategy,
};
use tracing::debug;

use crate::client::RedisClient;
use crate::fields::{
    history_entry_fields, parse_ts, FIELD_GATEWAY_ID, FIELD_LAT, FIELD_LNG, FIELD_RSSI, FIELD_TS,
};
use crate::keys;

/// Redis implementation of [`TagHistoryRepository`]: one stream per tag at
/// `tag:history:{tagId}`. Stream IDs give the store-assigned monotonic
/// insertion order; XTRIM bounds growth without blocking appends.
#[derive(Clone)]
pub struct RedisTagHistoryRepository {
    client: RedisClient,
}

impl RedisTagHistoryRepository {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

fn stream_maxlen(strategy: TrimStrategy) -> StreamMaxlen {
    match strategy {
        TrimStrategy::Approximate(n) => StreamMaxlen::Approx(n),
        TrimStrategy::Exact(n) => StreamMaxlen::Equals(n),
    }
}

fn parse_history_entry(id: &StreamId) -> Option<HistoryEntry> {
    let lat: f64 = id.get(FIELD_LAT)?;
    let lng: f64 = id.get(FIELD_LNG)?;
    let rssi: i32 = id.get(FIELD_RSSI)?;
    let gateway_id: String = id.get(FIELD_GATEWAY_ID)?;
    let ts_raw: String = id.get(FIELD_TS)?;
    Some(HistoryEntry {
        gateway_id,
        ts: parse_ts(&ts_raw)?,
        lat,
        lng,
        rssi,
    })
}

#[async_trait]
impl TagHistoryRepository for RedisTagHistoryRepository {
    async fn append(&self, tag_id: &str, entry: HistoryEntry) -> DomainResult<()> {
        let key = keys::history_key(tag_id);
        let mut conn = self.client.connection();

        let id: String = conn
            .xadd(&key, "*", &history_entry_fields(&entry))
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;
        debug!(tag_id = %tag_id, stream_id = %id, "appended history entry");
        Ok(())
    }

    async fn trim(&self, tag_id: &str, strategy: TrimStrategy) -> DomainResult<()> {
        let key = keys::history_key(tag_id);
        let mut conn = self.client.connection();

        let evicted: i64 = conn
            .xtrim(&key, stream_maxlen(strategy))
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;
        if evicted > 0 {
            debug!(tag_id = %tag_id, evicted, "trimmed history log");
        }
        Ok(())
    }

    async fn read_all(&self, tag_id: &str) -> DomainResult<Vec<HistoryEntry>> {
        let key = keys::history_key(tag_id);
        let mut conn = self.client.connection();

        let reply: StreamRangeReply = conn
            .xrange_all(&key)
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;

        // Entries written before a field was introduced (or corrupted out of
        // band) are skipped rather than surfaced as partial records.
        Ok(reply.ids.iter().filter_map(parse_history_entry).collect())
    }
}

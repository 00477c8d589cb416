use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use tagtrail_domain::{DomainError, DomainResult, LiveState, LiveStateRepository};
use tracing::debug;

use crate::client::RedisClient;
use crate::fields::{live_state_fields, parse_live_state};
use crate::keys;

/// Inactivity window before a tag drops out of the live view: roughly two
/// missed reporting cycles.
pub const LIVE_STATE_TTL_SECS: i64 = 130;

const SCAN_BATCH_SIZE: usize = 100;

/// Redis implementation of [`LiveStateRepository`]: one hash per tag at
/// `tag:latest:{tagId}`, written with a fresh TTL in an atomic pipeline.
#[derive(Clone)]
pub struct RedisLiveStateRepository {
    client: RedisClient,
}

impl RedisLiveStateRepository {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LiveStateRepository for RedisLiveStateRepository {
    async fn set_live_state(&self, tag_id: &str, state: LiveState) -> DomainResult<()> {
        let key = keys::live_state_key(tag_id);
        debug!(tag_id = %tag_id, "writing live state");

        let mut conn = self.client.connection();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_multiple(&key, &live_state_fields(&state))
            .ignore()
            .expire(&key, LIVE_STATE_TTL_SECS)
            .ignore();
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;
        Ok(())
    }

    async fn get_live_state(&self, tag_id: &str) -> DomainResult<Option<LiveState>> {
        let key = keys::live_state_key(tag_id);
        let mut conn = self.client.connection();

        // HGETALL on a missing or expired key yields an empty map; Redis
        // treats a logically expired key as absent on read regardless of
        // physical deletion timing.
        let map: HashMap<String, String> = conn
            .hgetall(&key)
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;
        if map.is_empty() {
            return Ok(None);
        }
        Ok(parse_live_state(&map))
    }

    async fn list_live_tag_ids(&self) -> DomainResult<Vec<String>> {
        let mut conn = self.client.connection();
        let mut scanned_keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(keys::LIVE_STATE_KEY_PATTERN)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut conn)
                .await
                .map_err(|e| DomainError::StoreError(e.into()))?;

            scanned_keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        let tag_ids = tag_ids_from_scanned_keys(scanned_keys);
        debug!(live_tag_count = tag_ids.len(), "scanned live tag keys");
        Ok(tag_ids)
    }
}

/// SCAN may return the same key more than once within one full iteration
/// (e.g. while the keyspace is rehashing), so the listing is a set, not a bag.
fn tag_ids_from_scanned_keys(scanned_keys: Vec<String>) -> Vec<String> {
    let mut tag_ids: Vec<String> = scanned_keys
        .iter()
        .filter_map(|key| keys::tag_id_from_live_key(key))
        .map(str::to_string)
        .collect();
    tag_ids.sort_unstable();
    tag_ids.dedup();
    tag_ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanned_keys_are_deduplicated() {
        let scanned = vec![
            "tag:latest:tagB".to_string(),
            "tag:latest:tagA".to_string(),
            "tag:latest:tagA".to_string(),
            "gateway_id:gw1:heartbeat".to_string(),
        ];

        assert_eq!(
            tag_ids_from_scanned_keys(scanned),
            vec!["tagA".to_string(), "tagB".to_string()]
        );
    }
}

use async_trait::async_trait;
use tagtrail_domain::{DomainError, DomainResult, ObservationRecorder, TagObservation};
use tracing::debug;

use crate::client::RedisClient;
use crate::fields::{history_entry_fields, live_state_fields};
use crate::keys;
use crate::live_state_repository::LIVE_STATE_TTL_SECS;

/// Redis implementation of [`ObservationRecorder`].
///
/// The live-state overwrite and the history append for one observation go
/// through a single MULTI/EXEC pipeline, so a crash or connection loss cannot
/// leave the live state updated without its matching history entry (or vice
/// versa).
#[derive(Clone)]
pub struct RedisObservationRecorder {
    client: RedisClient,
}

impl RedisObservationRecorder {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObservationRecorder for RedisObservationRecorder {
    async fn record_observation(&self, observation: TagObservation) -> DomainResult<()> {
        let live_key = keys::live_state_key(&observation.tag_id);
        let history_key = keys::history_key(&observation.tag_id);
        let state = observation.live_state();
        let entry = observation.history_entry();

        debug!(
            tag_id = %observation.tag_id,
            gateway_id = %observation.gateway_id,
            "recording observation"
        );

        let mut conn = self.client.connection();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_multiple(&live_key, &live_state_fields(&state))
            .ignore()
            .expire(&live_key, LIVE_STATE_TTL_SECS)
            .ignore()
            .xadd(&history_key, "*", &history_entry_fields(&entry))
            .ignore();
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;
        Ok(())
    }
}

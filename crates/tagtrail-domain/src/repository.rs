use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainResult;
use crate::gateway::GatewayTelemetry;
use crate::session::DeviceSession;
use crate::tag::{HistoryEntry, LiveState, TagObservation};
use crate::trim::TrimStrategy;

/// Live-state cache: most recent known position/signal state per tag, with a
/// fixed inactivity TTL enforced by the backing store.
/// Infrastructure layer (tagtrail-redis) implements this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiveStateRepository: Send + Sync {
    /// Replaces all fields atomically and resets the expiry window.
    async fn set_live_state(&self, tag_id: &str, state: LiveState) -> DomainResult<()>;

    /// Returns the current state, or `None` if never set, expired, or torn.
    async fn get_live_state(&self, tag_id: &str) -> DomainResult<Option<LiveState>>;

    /// Returns every tag whose state has not expired. A logically expired key
    /// must behave as absent even if the store has not physically deleted it.
    async fn list_live_tag_ids(&self) -> DomainResult<Vec<String>>;
}

/// Capped append-only per-tag history log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagHistoryRepository: Send + Sync {
    /// Appends at the tail with a store-assigned monotonic position. Never
    /// fails due to log size.
    async fn append(&self, tag_id: &str, entry: HistoryEntry) -> DomainResult<()>;

    /// Best-effort cap enforcement. Callers treat failure as advisory.
    async fn trim(&self, tag_id: &str, strategy: TrimStrategy) -> DomainResult<()>;

    /// All retained entries in insertion order; empty when the tag has no
    /// history or everything has been trimmed away.
    async fn read_all(&self, tag_id: &str) -> DomainResult<Vec<HistoryEntry>>;
}

/// Writes one observation's live-state overwrite and history append as a
/// single atomic unit, so a partial failure cannot leave one store updated
/// without the other.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObservationRecorder: Send + Sync {
    async fn record_observation(&self, observation: TagObservation) -> DomainResult<()>;
}

/// Gateway heartbeat and unique-device traffic samples. A separate concern
/// from tag tracking; writes succeed or fail independently of tag writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GatewayTelemetryRepository: Send + Sync {
    /// Stores `ts` under the gateway's heartbeat key. Callers pass receipt
    /// time, not a batch-reported time, so redelivery never rewinds liveness.
    async fn record_heartbeat(&self, gateway_id: &str, ts: DateTime<Utc>) -> DomainResult<()>;

    async fn record_traffic_sample(&self, sample: GatewayTelemetry) -> DomainResult<()>;
}

/// Stores deduplicated device session summaries from the alternate ingestion
/// path. Entries age out on their own 14-day expiry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceSessionRepository: Send + Sync {
    /// Returns the number of sessions stored.
    async fn record_sessions(&self, sessions: Vec<DeviceSession>) -> DomainResult<usize>;
}

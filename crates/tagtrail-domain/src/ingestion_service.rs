use std::sync::Arc;

use chrono::Utc;
use futures::future;
use tracing::{debug, error, info, warn};

use crate::batch::{AssetTrackingReport, IngestBatch, IngestReport};
use crate::error::{DomainError, DomainResult};
use crate::gateway::GatewayTelemetry;
use crate::repository::{
    DeviceSessionRepository, GatewayTelemetryRepository, ObservationRecorder, TagHistoryRepository,
};
use crate::tag::TagObservation;
use crate::trim::TrimStrategy;

/// Default cap on a tag's retained history.
pub const DEFAULT_HISTORY_CAP: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionServiceConfig {
    /// `None` disables trimming entirely; bounded growth then depends on the
    /// store's own retention.
    pub trim_strategy: Option<TrimStrategy>,
}

impl Default for IngestionServiceConfig {
    fn default() -> Self {
        Self {
            trim_strategy: Some(TrimStrategy::Approximate(DEFAULT_HISTORY_CAP)),
        }
    }
}

/// Domain service that fans one authenticated gateway batch out to the live
/// state cache, history log, gateway telemetry keys, and session store.
///
/// Flow for a sectioned report:
/// 1. Record gateway heartbeat + traffic sample when telemetry is present
/// 2. Fan the asset-tracking section out into per-tag observations
/// 3. Record each observation's live+history pair atomically, concurrently
///    across tags, then trim the tag's history (advisory)
/// 4. Aggregate per-tag outcomes; one tag's failure never blocks a sibling
pub struct IngestionService {
    recorder: Arc<dyn ObservationRecorder>,
    history: Arc<dyn TagHistoryRepository>,
    telemetry: Arc<dyn GatewayTelemetryRepository>,
    sessions: Arc<dyn DeviceSessionRepository>,
    config: IngestionServiceConfig,
}

impl IngestionService {
    pub fn new(
        recorder: Arc<dyn ObservationRecorder>,
        history: Arc<dyn TagHistoryRepository>,
        telemetry: Arc<dyn GatewayTelemetryRepository>,
        sessions: Arc<dyn DeviceSessionRepository>,
        config: IngestionServiceConfig,
    ) -> Self {
        Self {
            recorder,
            history,
            telemetry,
            sessions,
            config,
        }
    }

    /// Processes one batch and reports aggregate counts.
    ///
    /// Returns an error only when every attempted write failed (the store is
    /// presumed unreachable and the gateway should redeliver) — partial
    /// failure is reported through the counts instead.
    pub async fn ingest(&self, batch: IngestBatch) -> DomainResult<IngestReport> {
        match batch {
            IngestBatch::Report {
                telemetry,
                asset_tracking,
            } => self.ingest_report(telemetry, asset_tracking).await,
            IngestBatch::Sessions(sessions) => {
                debug!(session_count = sessions.len(), "recording device sessions");
                let recorded = self.sessions.record_sessions(sessions).await?;
                Ok(IngestReport {
                    sessions_recorded: recorded,
                    ..IngestReport::default()
                })
            }
        }
    }

    async fn ingest_report(
        &self,
        telemetry: Option<GatewayTelemetry>,
        asset_tracking: Option<AssetTrackingReport>,
    ) -> DomainResult<IngestReport> {
        let mut report = IngestReport::default();
        let mut attempted = 0usize;
        let mut failed = 0usize;
        let mut last_error: Option<DomainError> = None;

        if let Some(sample) = telemetry {
            attempted += 1;
            match self.record_gateway_telemetry(&sample).await {
                Ok(()) => report.telemetry_recorded = true,
                Err(err) => {
                    error!(
                        gateway_id = %sample.gateway_id,
                        error = %err,
                        "failed to record gateway telemetry"
                    );
                    failed += 1;
                    last_error = Some(err);
                }
            }
        }

        if let Some(tracking) = asset_tracking {
            let gateway_id = tracking.gateway_id.clone();
            let observations = tracking.into_observations();
            attempted += observations.len();
            debug!(
                gateway_id = %gateway_id,
                tag_count = observations.len(),
                "recording tag observations"
            );

            // Tags within a batch are independent; record them concurrently
            // with no ordering between them.
            let results = future::join_all(
                observations
                    .into_iter()
                    .map(|observation| self.record_tag(observation)),
            )
            .await;

            for result in results {
                match result {
                    Ok(()) => report.tags_recorded += 1,
                    Err(err) => {
                        error!(gateway_id = %gateway_id, error = %err, "tag write failed");
                        failed += 1;
                        report.tags_failed += 1;
                        last_error = Some(err);
                    }
                }
            }
        }

        if attempted > 0 && failed == attempted {
            if let Some(err) = last_error {
                return Err(err);
            }
        }

        info!(
            telemetry_recorded = report.telemetry_recorded,
            tags_recorded = report.tags_recorded,
            tags_failed = report.tags_failed,
            "ingest batch processed"
        );
        Ok(report)
    }

    async fn record_gateway_telemetry(&self, sample: &GatewayTelemetry) -> DomainResult<()> {
        // The heartbeat carries receipt time, not the batch's reported time: a
        // redelivered stale batch must not rewind gateway liveness. The batch
        // timestamp still keys and scores the traffic sample.
        self.telemetry
            .record_heartbeat(&sample.gateway_id, Utc::now())
            .await?;
        self.telemetry.record_traffic_sample(sample.clone()).await?;
        Ok(())
    }

    async fn record_tag(&self, observation: TagObservation) -> DomainResult<()> {
        if observation.tag_id.is_empty() {
            return Err(DomainError::InvalidTagId("empty tag ID".to_string()));
        }
        let tag_id = observation.tag_id.clone();

        self.recorder.record_observation(observation).await?;

        if let Some(strategy) = self.config.trim_strategy {
            // Advisory housekeeping: a failed trim affects storage efficiency,
            // not correctness of reads up to the cap.
            if let Err(err) = self.history.trim(&tag_id, strategy).await {
                warn!(tag_id = %tag_id, error = %err, "history trim failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::TagPing;
    use crate::repository::{
        MockDeviceSessionRepository, MockGatewayTelemetryRepository, MockObservationRecorder,
        MockTagHistoryRepository,
    };
    use crate::session::DeviceSession;
    use anyhow::anyhow;
    use chrono::{TimeZone, Utc};

    fn service_with(
        recorder: MockObservationRecorder,
        history: MockTagHistoryRepository,
        telemetry: MockGatewayTelemetryRepository,
        sessions: MockDeviceSessionRepository,
    ) -> IngestionService {
        IngestionService::new(
            Arc::new(recorder),
            Arc::new(history),
            Arc::new(telemetry),
            Arc::new(sessions),
            IngestionServiceConfig::default(),
        )
    }

    fn tracking(tags: Vec<TagPing>) -> AssetTrackingReport {
        AssetTrackingReport {
            gateway_id: "gw1".to_string(),
            ts: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            lat: 38.63,
            lng: -90.20,
            tags,
        }
    }

    #[tokio::test]
    async fn test_ingest_asset_tracking_records_live_and_history() {
        // Arrange
        let mut recorder = MockObservationRecorder::new();
        let mut history = MockTagHistoryRepository::new();
        let telemetry = MockGatewayTelemetryRepository::new();
        let sessions = MockDeviceSessionRepository::new();

        recorder
            .expect_record_observation()
            .withf(|obs: &TagObservation| {
                obs.tag_id == "tagA"
                    && obs.gateway_id == "gw1"
                    && obs.lat == 38.63
                    && obs.lng == -90.20
                    && obs.rssi == -65
            })
            .times(1)
            .return_once(|_| Ok(()));
        history
            .expect_trim()
            .withf(|tag_id: &str, strategy: &TrimStrategy| {
                tag_id == "tagA" && *strategy == TrimStrategy::Approximate(DEFAULT_HISTORY_CAP)
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let service = service_with(recorder, history, telemetry, sessions);

        // Act
        let report = service
            .ingest(IngestBatch::Report {
                telemetry: None,
                asset_tracking: Some(tracking(vec![TagPing {
                    id: "tagA".to_string(),
                    rssi: -65,
                }])),
            })
            .await
            .unwrap();

        // Assert
        assert_eq!(report.tags_recorded, 1);
        assert_eq!(report.tags_failed, 0);
        assert!(!report.telemetry_recorded);
    }

    #[tokio::test]
    async fn test_tag_failure_does_not_block_siblings() {
        // Arrange
        let mut recorder = MockObservationRecorder::new();
        let mut history = MockTagHistoryRepository::new();
        let telemetry = MockGatewayTelemetryRepository::new();
        let sessions = MockDeviceSessionRepository::new();

        recorder
            .expect_record_observation()
            .times(2)
            .returning(|obs| {
                if obs.tag_id == "bad" {
                    Err(DomainError::StoreError(anyhow!("write refused")))
                } else {
                    Ok(())
                }
            });
        // Only the successful tag reaches the trim step.
        history.expect_trim().times(1).returning(|_, _| Ok(()));

        let service = service_with(recorder, history, telemetry, sessions);

        // Act
        let report = service
            .ingest(IngestBatch::Report {
                telemetry: None,
                asset_tracking: Some(tracking(vec![
                    TagPing {
                        id: "bad".to_string(),
                        rssi: -70,
                    },
                    TagPing {
                        id: "good".to_string(),
                        rssi: -60,
                    },
                ])),
            })
            .await
            .unwrap();

        // Assert
        assert_eq!(report.tags_recorded, 1);
        assert_eq!(report.tags_failed, 1);
    }

    #[tokio::test]
    async fn test_all_writes_failed_surfaces_store_error() {
        // Arrange
        let mut recorder = MockObservationRecorder::new();
        let history = MockTagHistoryRepository::new();
        let telemetry = MockGatewayTelemetryRepository::new();
        let sessions = MockDeviceSessionRepository::new();

        recorder
            .expect_record_observation()
            .times(1)
            .returning(|_| Err(DomainError::StoreError(anyhow!("connection refused"))));

        let service = service_with(recorder, history, telemetry, sessions);

        // Act
        let result = service
            .ingest(IngestBatch::Report {
                telemetry: None,
                asset_tracking: Some(tracking(vec![TagPing {
                    id: "tagA".to_string(),
                    rssi: -65,
                }])),
            })
            .await;

        // Assert
        assert!(matches!(result, Err(DomainError::StoreError(_))));
    }

    #[tokio::test]
    async fn test_trim_failure_is_advisory() {
        // Arrange
        let mut recorder = MockObservationRecorder::new();
        let mut history = MockTagHistoryRepository::new();
        let telemetry = MockGatewayTelemetryRepository::new();
        let sessions = MockDeviceSessionRepository::new();

        recorder
            .expect_record_observation()
            .times(1)
            .return_once(|_| Ok(()));
        history
            .expect_trim()
            .times(1)
            .returning(|_, _| Err(DomainError::StoreError(anyhow!("XTRIM failed"))));

        let service = service_with(recorder, history, telemetry, sessions);

        // Act
        let report = service
            .ingest(IngestBatch::Report {
                telemetry: None,
                asset_tracking: Some(tracking(vec![TagPing {
                    id: "tagA".to_string(),
                    rssi: -65,
                }])),
            })
            .await
            .unwrap();

        // Assert
        assert_eq!(report.tags_recorded, 1);
        assert_eq!(report.tags_failed, 0);
    }

    #[tokio::test]
    async fn test_telemetry_section_records_heartbeat_and_traffic() {
        // Arrange
        let recorder = MockObservationRecorder::new();
        let history = MockTagHistoryRepository::new();
        let mut telemetry = MockGatewayTelemetryRepository::new();
        let sessions = MockDeviceSessionRepository::new();

        // The batch reports a long-stale timestamp; the heartbeat must still
        // be stamped with receipt time so redelivery cannot rewind liveness.
        let batch_ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let before = Utc::now();
        telemetry
            .expect_record_heartbeat()
            .withf(move |gateway_id: &str, at| gateway_id == "gw1" && *at >= before)
            .times(1)
            .return_once(|_, _| Ok(()));
        telemetry
            .expect_record_traffic_sample()
            .withf(move |sample: &GatewayTelemetry| {
                sample.gateway_id == "gw1"
                    && sample.unique_devices == 12
                    && sample.timestamp == batch_ts
            })
            .times(1)
            .return_once(|_| Ok(()));

        let service = service_with(recorder, history, telemetry, sessions);

        // Act
        let report = service
            .ingest(IngestBatch::Report {
                telemetry: Some(GatewayTelemetry {
                    gateway_id: "gw1".to_string(),
                    timestamp: batch_ts,
                    unique_devices: 12,
                }),
                asset_tracking: None,
            })
            .await
            .unwrap();

        // Assert
        assert!(report.telemetry_recorded);
        assert_eq!(report.tags_recorded, 0);
    }

    #[tokio::test]
    async fn test_telemetry_failure_does_not_block_tag_writes() {
        // Arrange
        let mut recorder = MockObservationRecorder::new();
        let mut history = MockTagHistoryRepository::new();
        let mut telemetry = MockGatewayTelemetryRepository::new();
        let sessions = MockDeviceSessionRepository::new();

        telemetry
            .expect_record_heartbeat()
            .times(1)
            .returning(|_, _| Err(DomainError::StoreError(anyhow!("SET failed"))));
        recorder
            .expect_record_observation()
            .times(1)
            .return_once(|_| Ok(()));
        history.expect_trim().times(1).return_once(|_, _| Ok(()));

        let service = service_with(recorder, history, telemetry, sessions);

        // Act
        let report = service
            .ingest(IngestBatch::Report {
                telemetry: Some(GatewayTelemetry {
                    gateway_id: "gw1".to_string(),
                    timestamp: Utc::now(),
                    unique_devices: 3,
                }),
                asset_tracking: Some(tracking(vec![TagPing {
                    id: "tagA".to_string(),
                    rssi: -65,
                }])),
            })
            .await
            .unwrap();

        // Assert
        assert!(!report.telemetry_recorded);
        assert_eq!(report.tags_recorded, 1);
    }

    #[tokio::test]
    async fn test_session_batch_reports_stored_count() {
        // Arrange
        let recorder = MockObservationRecorder::new();
        let history = MockTagHistoryRepository::new();
        let telemetry = MockGatewayTelemetryRepository::new();
        let mut sessions = MockDeviceSessionRepository::new();

        sessions
            .expect_record_sessions()
            .withf(|batch: &Vec<DeviceSession>| batch.len() == 2)
            .times(1)
            .return_once(|batch| Ok(batch.len()));

        let service = service_with(recorder, history, telemetry, sessions);

        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let session = DeviceSession {
            hashed_id: "a1b2c3".to_string(),
            first_seen: ts,
            last_seen: ts,
            rssi_min: -80,
            rssi_max: -60,
            rssi_variance: 4.5,
            detections: 7,
        };

        // Act
        let report = service
            .ingest(IngestBatch::Sessions(vec![
                session.clone(),
                DeviceSession {
                    hashed_id: "d4e5f6".to_string(),
                    ..session
                },
            ]))
            .await
            .unwrap();

        // Assert
        assert_eq!(report.sessions_recorded, 2);
    }

    #[tokio::test]
    async fn test_empty_report_is_accepted() {
        // Arrange
        let recorder = MockObservationRecorder::new();
        let history = MockTagHistoryRepository::new();
        let telemetry = MockGatewayTelemetryRepository::new();
        let sessions = MockDeviceSessionRepository::new();

        let service = service_with(recorder, history, telemetry, sessions);

        // Act
        let report = service
            .ingest(IngestBatch::Report {
                telemetry: None,
                asset_tracking: None,
            })
            .await
            .unwrap();

        // Assert
        assert_eq!(report, IngestReport::default());
    }

    #[tokio::test]
    async fn test_empty_tag_id_is_rejected() {
        // Arrange
        let recorder = MockObservationRecorder::new();
        let history = MockTagHistoryRepository::new();
        let telemetry = MockGatewayTelemetryRepository::new();
        let sessions = MockDeviceSessionRepository::new();

        let service = service_with(recorder, history, telemetry, sessions);

        // Act
        let result = service
            .ingest(IngestBatch::Report {
                telemetry: None,
                asset_tracking: Some(tracking(vec![TagPing {
                    id: String::new(),
                    rssi: -65,
                }])),
            })
            .await;

        // Assert
        assert!(matches!(result, Err(DomainError::InvalidTagId(_))));
    }
}

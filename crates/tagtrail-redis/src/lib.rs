pub mod client;
pub mod device_session_repository;
mod fields;
pub mod gateway_telemetry_repository;
pub mod history_repository;
pub mod keys;
pub mod live_state_repository;
pub mod observation_recorder;

pub use client::RedisClient;
pub use device_session_repository::RedisDeviceSessionRepository;
pub use gateway_telemetry_repository::RedisGatewayTelemetryRepository;
pub use history_repository::RedisTagHistoryRepository;
pub use live_state_repository::{RedisLiveStateRepository, LIVE_STATE_TTL_SECS};
pub use observation_recorder::RedisObservationRecorder;

pub mod batch;
pub mod error;
pub mod gateway;
pub mod ingestion_service;
pub mod query_service;
pub mod repository;
pub mod session;
pub mod tag;
pub mod trim;

pub use batch::*;
pub use error::{DomainError, DomainResult};
pub use gateway::*;
pub use ingestion_service::{IngestionService, IngestionServiceConfig};
pub use query_service::QueryService;
pub use repository::{
    DeviceSessionRepository, GatewayTelemetryRepository, LiveStateRepository, ObservationRecorder,
    TagHistoryRepository,
};
pub use session::*;
pub use tag::*;
pub use trim::TrimStrategy;

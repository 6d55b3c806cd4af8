//! Wire types returned by the statistics, station metadata and system APIs.
//!
//! The types are deliberately tolerant: unknown fields are ignored, most
//! numeric fields default to zero, and the two Mongo extended-JSON shapes
//! the time-series endpoints emit are normalized by [`MongoDate`] and
//! [`MongoId`].

mod common;
mod health;
mod operation;
mod station;
mod stats;
mod system;

pub use common::{
    AlertDetails, CategoryBreakdown, DetectionStatistics, MongoDate, MongoId,
    PickingStatistics, Severity, TrendData,
};
pub use health::{
    AlertRecord, MachineHealthRecord, PeriodHealthStatistics, ProductionSummary,
    StationMetadata, SystemHealthRecord, SystemTemperatures, SystemUsage,
};
pub use operation::{
    CurrentOperationStatus, OperationPeriodInfo, OperationServiceHealth, OperationSummary,
    StationOperationStats, StationOperationStatus, TotalOperationStats,
};
pub use station::{
    SiteStations, SitesResponse, StationCacheStatus, StationRef, StationStatus,
    StationsBySiteResponse,
};
pub use stats::{PeriodStatistics, RequestedPeriod};
pub use system::{HealthCheckResponse, ServiceStatus};

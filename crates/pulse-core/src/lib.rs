//! Pulse Core - Domain types and API transport
//!
//! This crate provides the foundational pieces of Station Pulse: the error
//! taxonomy, the wire types of the statistics and station metadata APIs,
//! query parameters, envelope decoding and the [`ApiTransport`] seam every
//! request goes through.

pub mod envelope;
pub mod error;
pub mod params;
pub mod transport;
pub mod types;

pub use envelope::Acknowledgement;
pub use error::{DashboardError, ErrorKind, Result};
pub use params::{
    CurrentStatusParams, Granularity, OperationPeriodParams, PeriodParams, PeriodStatsParams,
    StationFilter, StationIdFilter, SummaryPeriod,
};
pub use transport::{ApiRequest, ApiTransport, HttpTransport, HttpTransportConfig, Method};
pub use types::{MongoDate, MongoId};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

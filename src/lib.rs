//! Capacity analytics and reporting engine.
//!
//! Pure functions from a log of capacity self-reports to windowed pattern
//! metrics, a decline projection and an audit-stamped quarterly report.
//! Insufficient history is reported as `Ok(None)`; only caller defects are
//! errors.

pub mod aggregate;
pub mod config;
pub mod downsample;
pub mod error;
pub mod identity;
pub mod import;
pub mod models;
pub mod pattern;
pub mod projection;
pub mod provenance;
pub mod render;
pub mod report;
pub mod snapshot;
pub mod stats;
pub mod temporal;

pub use config::{EngineConfig, Thresholds};
pub use error::{EngineError, EngineResult};
pub use models::{
    CapacityState, Category, ContinuityRating, DailyPoint, DateWindow, Observation,
    PatternMetrics, ProjectionResult, Verdict,
};
pub use projection::project_trend;
pub use report::{generate_quarterly_report, QuarterlyReport};
pub use snapshot::{pattern_snapshot, PatternSnapshot};

//! Echo-integration core for multi-channel hydroacoustic surveys.
//!
//! Calibrated ping-by-range samples go in; a balanced long-format table of
//! mean backscatter per interval × layer cell comes out. The modules follow
//! the processing order: channel classification, grid partitioning,
//! exclusion, integration, assembly and layer balancing.

pub mod acquisition;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{IntegrationConfig, PipelineError, PipelineResult};
pub use processing::{IntegrationPipeline, PipelineOutput, TableRow};

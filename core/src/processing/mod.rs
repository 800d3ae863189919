pub mod assembler;
pub mod balancer;
pub mod classifier;
pub mod exclusion;
pub mod grid;
pub mod integrator;
pub mod pipeline;

pub use assembler::{ChannelTable, TableAssembler, TableRow};
pub use balancer::LayerBalancer;
pub use classifier::{ChannelClass, Classification};
pub use exclusion::{ExclusionResolver, ExclusionWindow};
pub use grid::{Grid, GridPartitioner};
pub use integrator::{CellValue, IntegrationResult, Integrator};
pub use pipeline::{IntegrationPipeline, PipelineOutput};

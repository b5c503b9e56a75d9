mod engine;
mod job;
mod metrics;
mod prefill_marker;
mod result;
mod sample;

pub use engine::{BenchTool, BenchmarkLevel, IoEngine, PollMode};
pub use job::{JobSpec, WorkloadDescriptor};
pub use metrics::ParsedMetrics;
pub use prefill_marker::PrefillMarker;
pub use result::{ResultRecord, RESULT_COLUMNS};
pub use sample::{CpuSummary, ResourceSample};

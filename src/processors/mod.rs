pub mod campaign;
pub mod command;
pub mod executor;
pub mod grid;
pub mod prefill;
pub mod sampler;

pub use campaign::{resolve_target, Campaign, CampaignSummary, PrefillState};
pub use executor::{ExecError, ExecutorOptions, JobExecutor, JobOutcome};
pub use grid::{is_valid_combination, points, total_tests, GridAxes};
pub use prefill::{
    prefill_many, FioPrefill, PrefillBackend, PrefillError, PrefillStatus, PrefillTracker,
    SpdkPrefill,
};
pub use sampler::{
    trim_and_average, ProcessTreeProbe, ResourceSampler, SamplerHandle, SamplerOptions,
    SysinfoProbe,
};

pub mod models;
pub mod output;
pub mod parsers;
pub mod processors;
pub mod utils;

// 주요 기능 재내보내기(re-exporting)
pub use models::{BenchTool, BenchmarkLevel, IoEngine, JobSpec, ParsedMetrics, PollMode, ResultRecord};
pub use output::{save_results_to_parquet, ResultStore};
pub use parsers::parse_output;
pub use processors::{Campaign, CampaignSummary, JobExecutor, JobOutcome, PrefillTracker};
pub use utils::CampaignConfig;

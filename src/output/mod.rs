pub mod csv;
pub mod json;
mod parquet;
mod statistics;

pub use self::csv::{save_cpu_timeline, ResultStore};
pub use json::{read_record_json, write_record_json};
pub use parquet::{result_schema, save_results_to_parquet};
pub use statistics::{print_summary, summarize_by_engine, EngineSummary};

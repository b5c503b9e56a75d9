pub mod config;
pub mod constants;
pub mod logger;
pub mod size;

pub use self::config::{CampaignConfig, ConfigError, PrefillFailurePolicy, SamplerConfig};
pub use self::logger::Logger;
pub use self::size::{block_size_to_bytes, bytes_to_human, device_basename, safe_filename};

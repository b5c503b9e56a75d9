//! 캠페인 설정 (JSON 파일)
//!
//! 모든 필드는 기본값이 있으므로 설정 파일에는 바꾸고 싶은 항목만 적으면 된다.

use crate::models::{BenchTool, BenchmarkLevel, IoEngine, PollMode, WorkloadDescriptor};
use crate::utils::constants::{
    DEFAULT_SAMPLER_WARMUP_MS, DEFAULT_SAMPLE_INTERVAL_MS, DEFAULT_TRIM_RATIO,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 프리필이 실패한 대상의 측정 작업 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefillFailurePolicy {
    /// 로그만 남기고 측정은 계속
    #[default]
    Continue,
    /// 해당 대상의 프리필이 필요한 작업은 실패로 처리
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub interval_ms: u64,
    pub warmup_ms: u64,
    pub trim_ratio: f64,
    pub per_core: bool,
    pub save_timeline: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            warmup_ms: DEFAULT_SAMPLER_WARMUP_MS,
            trim_ratio: DEFAULT_TRIM_RATIO,
            per_core: false,
            save_timeline: false,
        }
    }
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub tag: String,
    pub tool: BenchTool,
    pub level: BenchmarkLevel,

    // 그리드 축 (선언 순서가 곧 순회 순서)
    pub devices: Vec<String>,
    pub filesystems: Vec<String>,
    pub workloads: Vec<WorkloadDescriptor>,
    pub block_sizes: Vec<String>,
    pub io_engines: Vec<IoEngine>,
    pub poll_modes: Vec<PollMode>,
    pub queue_depths: Vec<u32>,
    pub numjobs: Vec<u32>,
    pub gpu_ids: Vec<u32>,

    // 파일 레벨 측정 시 미리 준비된 테스트 파일 위치
    pub mount_base: PathBuf,
    pub test_file_name: String,

    pub runtime_seconds: u64,
    pub prefill_runtime_seconds: u64,
    pub use_direct: bool,
    pub enable_resume: bool,
    pub force_prefill: bool,
    pub on_prefill_failure: PrefillFailurePolicy,

    pub results_dir: PathBuf,
    pub marker_dir: PathBuf,
    /// fio 실행 명령 (예: ["sudo", "fio"])
    pub fio_command: Vec<String>,
    pub spdk_dir: PathBuf,

    pub sampler: SamplerConfig,
    pub save_raw_output: bool,
    pub export_parquet: bool,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            tag: "dse".to_string(),
            tool: BenchTool::Fio,
            level: BenchmarkLevel::Block,
            devices: vec!["/dev/nvme0n1".to_string()],
            filesystems: vec!["xfs".to_string(), "ext4".to_string()],
            workloads: default_workloads(),
            block_sizes: vec!["4k".to_string(), "16k".to_string(), "1m".to_string()],
            io_engines: vec![IoEngine::Libaio, IoEngine::IoUring],
            poll_modes: vec![PollMode::None, PollMode::Hipri, PollMode::Sqpoll, PollMode::Full],
            queue_depths: vec![1, 4, 8, 16, 32],
            numjobs: vec![1, 2, 4, 8, 16],
            gpu_ids: Vec::new(),
            mount_base: PathBuf::from("/mnt/fio"),
            test_file_name: "testfile.dat".to_string(),
            runtime_seconds: 300,
            prefill_runtime_seconds: 120,
            use_direct: true,
            enable_resume: true,
            force_prefill: false,
            on_prefill_failure: PrefillFailurePolicy::Continue,
            results_dir: PathBuf::from("results"),
            marker_dir: PathBuf::from("prefill_status"),
            fio_command: vec!["fio".to_string()],
            spdk_dir: PathBuf::from("/opt/spdk"),
            sampler: SamplerConfig::default(),
            save_raw_output: true,
            export_parquet: true,
        }
    }
}

pub fn default_workloads() -> Vec<WorkloadDescriptor> {
    vec![
        WorkloadDescriptor::new("randread", "randread", None, true),
        WorkloadDescriptor::new("randwrite", "randwrite", None, false),
        WorkloadDescriptor::new("randrw_30", "randrw", Some(30), true),
        WorkloadDescriptor::new("randrw_50", "randrw", Some(50), true),
        WorkloadDescriptor::new("randrw_70", "randrw", Some(70), true),
    ]
}

impl CampaignConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: CampaignConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 치명적인 설정 오류만 에러로 돌려준다
    ///
    /// 비어 있는 축은 그리드가 0개가 될 뿐이므로 `warnings()`에서 알린다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..0.5).contains(&self.sampler.trim_ratio) {
            return Err(ConfigError::Invalid(format!(
                "sampler.trim_ratio must be in [0, 0.5), got {}",
                self.sampler.trim_ratio
            )));
        }
        if self.sampler.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sampler.interval_ms must be positive".to_string(),
            ));
        }
        if self.tool == BenchTool::Fio && self.fio_command.is_empty() {
            return Err(ConfigError::Invalid("fio_command must not be empty".to_string()));
        }
        if self.tool == BenchTool::SpdkPerf && self.level == BenchmarkLevel::File {
            return Err(ConfigError::Invalid(
                "spdk_perf only supports block level campaigns".to_string(),
            ));
        }
        Ok(())
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let axes: [(&str, usize); 7] = [
            ("devices", self.devices.len()),
            ("workloads", self.workloads.len()),
            ("block_sizes", self.block_sizes.len()),
            ("io_engines", self.io_engines.len()),
            ("poll_modes", self.poll_modes.len()),
            ("queue_depths", self.queue_depths.len()),
            ("numjobs", self.numjobs.len()),
        ];
        for (name, len) in axes {
            if len == 0 {
                warnings.push(format!("axis '{name}' is empty, the grid has no points"));
            }
        }
        if self.level == BenchmarkLevel::File && self.filesystems.is_empty() {
            warnings.push("file level campaign without filesystems".to_string());
        }
        if self.tool == BenchTool::SpdkPerf
            && self.io_engines.iter().any(|e| *e != IoEngine::Spdk)
        {
            warnings.push("spdk_perf ignores io_engines other than 'spdk'".to_string());
        }
        warnings
    }

    /// 블록 레벨은 "raw" 하나만 사용
    pub fn filesystem_axis(&self) -> Vec<String> {
        match self.level {
            BenchmarkLevel::Block => vec!["raw".to_string()],
            BenchmarkLevel::File => self.filesystems.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = CampaignConfig::from_json(
            r#"{ "devices": ["/dev/pmem0"], "block_sizes": ["2k", "4k"], "io_engines": ["libaio", "io_uring"] }"#,
        )
        .unwrap();
        assert_eq!(config.devices, vec!["/dev/pmem0"]);
        assert_eq!(config.queue_depths, vec![1, 4, 8, 16, 32]);
        assert_eq!(config.workloads.len(), 5);
        assert_eq!(config.sampler.trim_ratio, DEFAULT_TRIM_RATIO);
        assert!(config.enable_resume);
    }

    #[test]
    fn test_workload_deserialization() {
        let config = CampaignConfig::from_json(
            r#"{ "workloads": [ { "name": "randrw_30", "rw": "randrw", "rwmixread": 30, "needs_prefill": true },
                                { "name": "randwrite", "rw": "randwrite" } ] }"#,
        )
        .unwrap();
        assert_eq!(config.workloads[0].rwmixread, Some(30));
        assert!(!config.workloads[1].needs_prefill);
    }

    #[test]
    fn test_invalid_trim_ratio() {
        let err = CampaignConfig::from_json(r#"{ "sampler": { "trim_ratio": 0.7 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_axis_is_warning() {
        let config = CampaignConfig::from_json(r#"{ "queue_depths": [] }"#).unwrap();
        assert_eq!(config.warnings().len(), 1);
    }

    #[test]
    fn test_filesystem_axis() {
        let mut config = CampaignConfig::default();
        assert_eq!(config.filesystem_axis(), vec!["raw"]);
        config.level = BenchmarkLevel::File;
        assert_eq!(config.filesystem_axis(), vec!["xfs", "ext4"]);
    }

    #[test]
    fn test_round_trip_defaults() {
        let json = CampaignConfig::default().to_json_pretty().unwrap();
        assert_eq!(CampaignConfig::from_json(&json).unwrap(), CampaignConfig::default());
    }
}

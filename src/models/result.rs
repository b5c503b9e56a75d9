use crate::models::{BenchTool, CpuSummary, JobSpec, ParsedMetrics};
use serde::{Deserialize, Serialize};

/// CSV/Parquet 컬럼 순서
pub const RESULT_COLUMNS: [&str; 22] = [
    "test_id",
    "jobname",
    "tool",
    "device",
    "filesystem",
    "workload",
    "rw",
    "rwmixread",
    "block_size",
    "engine",
    "poll",
    "iodepth",
    "numjobs",
    "gpu_id",
    "iops",
    "latency",
    "bandwidth_mib_s",
    "read_latency",
    "write_latency",
    "cpu_usage_avg",
    "cpu_usage_total",
    "cpu_samples",
];

/// 저장 단위가 되는 결과 한 행
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub test_id: usize,
    pub jobname: String,
    pub tool: BenchTool,
    pub device: String,
    pub filesystem: String,
    pub workload: String,
    pub rw: String,
    pub rwmixread: Option<u8>,
    pub block_size: String,
    pub engine: String,
    pub poll: String,
    pub iodepth: u32,
    pub numjobs: u32,
    pub gpu_id: Option<u32>,
    pub iops: Option<f64>,
    pub latency: Option<f64>,
    #[serde(rename = "bandwidth_mib_s")]
    pub bandwidth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_latency: Option<f64>,
    pub cpu_usage_avg: f64,
    pub cpu_usage_total: f64,
    pub cpu_samples: usize,
}

impl ResultRecord {
    pub fn new(
        test_id: usize,
        job: &JobSpec,
        tool: BenchTool,
        metrics: ParsedMetrics,
        cpu: CpuSummary,
    ) -> Self {
        let workload = job.workload();
        Self {
            test_id,
            jobname: job.job_name(),
            tool,
            device: job.device().to_string(),
            filesystem: job.filesystem().to_string(),
            workload: workload.name.clone(),
            rw: workload.rw.clone(),
            rwmixread: workload.rwmixread,
            block_size: job.block_size().to_string(),
            engine: job.engine().to_string(),
            poll: job.poll().to_string(),
            iodepth: job.queue_depth(),
            numjobs: job.numjobs(),
            gpu_id: job.gpu_id(),
            iops: metrics.iops,
            latency: metrics.latency,
            bandwidth: metrics.bandwidth,
            read_latency: metrics.read_latency,
            write_latency: metrics.write_latency,
            cpu_usage_avg: cpu.avg,
            cpu_usage_total: cpu.total,
            cpu_samples: cpu.samples,
        }
    }

    /// `RESULT_COLUMNS` 순서의 CSV 필드. 없는 값은 빈 문자열.
    pub fn to_csv_row(&self) -> Vec<String> {
        fn opt<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        vec![
            self.test_id.to_string(),
            self.jobname.clone(),
            self.tool.display_name().to_string(),
            self.device.clone(),
            self.filesystem.clone(),
            self.workload.clone(),
            self.rw.clone(),
            opt(self.rwmixread),
            self.block_size.clone(),
            self.engine.clone(),
            self.poll.clone(),
            self.iodepth.to_string(),
            self.numjobs.to_string(),
            opt(self.gpu_id),
            opt(self.iops),
            opt(self.latency),
            opt(self.bandwidth),
            opt(self.read_latency),
            opt(self.write_latency),
            self.cpu_usage_avg.to_string(),
            self.cpu_usage_total.to_string(),
            self.cpu_samples.to_string(),
        ]
    }
}

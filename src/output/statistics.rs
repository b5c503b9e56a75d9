use crate::log;
use crate::models::ResultRecord;
use crate::parsers::round_to;
use std::collections::BTreeMap;

// 평균 계산용 누적기. 값이 없는 행은 건너뛴다.
#[derive(Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(round_to(self.sum / self.count as f64, 2))
        }
    }
}

/// 엔진별 결과 요약
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSummary {
    pub engine: String,
    pub jobs: usize,
    pub mean_iops: Option<f64>,
    pub mean_bandwidth: Option<f64>,
    pub mean_cpu: Option<f64>,
}

pub fn summarize_by_engine(records: &[ResultRecord]) -> Vec<EngineSummary> {
    let mut groups: BTreeMap<&str, (usize, MeanAccumulator, MeanAccumulator, MeanAccumulator)> =
        BTreeMap::new();

    for record in records {
        let (jobs, iops, bw, cpu) = groups.entry(record.engine.as_str()).or_default();
        *jobs += 1;
        iops.add(record.iops);
        bw.add(record.bandwidth);
        cpu.add(Some(record.cpu_usage_avg));
    }

    groups
        .into_iter()
        .map(|(engine, (jobs, iops, bw, cpu))| EngineSummary {
            engine: engine.to_string(),
            jobs,
            mean_iops: iops.mean(),
            mean_bandwidth: bw.mean(),
            mean_cpu: cpu.mean(),
        })
        .collect()
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

pub fn print_summary(records: &[ResultRecord]) {
    if records.is_empty() {
        log!("No results to summarize.");
        return;
    }

    log!("\n=== Summary by engine ===");
    log!(
        "{:<12} {:>6} {:>14} {:>14} {:>10}",
        "engine",
        "jobs",
        "IOPS",
        "BW(MiB/s)",
        "CPU(%)"
    );
    for summary in summarize_by_engine(records) {
        log!(
            "{:<12} {:>6} {:>14} {:>14} {:>10}",
            summary.engine,
            summary.jobs,
            fmt_opt(summary.mean_iops),
            fmt_opt(summary.mean_bandwidth),
            fmt_opt(summary.mean_cpu)
        );
    }
}

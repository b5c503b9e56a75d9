use crate::models::ResultRecord;
use std::fs;
use std::io;
use std::path::Path;

/// 작업 한 건의 결과를 보기 좋은 JSON으로 저장
pub fn write_record_json(path: &Path, record: &ResultRecord) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}

pub fn read_record_json(path: &Path) -> io::Result<ResultRecord> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BenchTool, CpuSummary, IoEngine, JobSpec, ParsedMetrics, PollMode, WorkloadDescriptor,
    };
    use tempfile::tempdir;

    #[test]
    fn test_record_json_round_trip() {
        let dir = tempdir().unwrap();
        let job = JobSpec::new(
            "0000:c3:00.0",
            "raw",
            WorkloadDescriptor::new("randread", "randread", None, true),
            "4k",
            IoEngine::Spdk,
            PollMode::None,
            32,
            1,
            None,
        )
        .unwrap();
        let metrics = ParsedMetrics {
            iops: Some(512300.0),
            latency: Some(61.2),
            bandwidth: Some(2001.17),
            ..Default::default()
        };
        let record = ResultRecord::new(4, &job, BenchTool::SpdkPerf, metrics, CpuSummary::default());

        let path = dir.path().join("json").join("job.json");
        write_record_json(&path, &record).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"tool\": \"spdk_perf\""));
        assert!(!content.contains("read_latency"));
        assert_eq!(read_record_json(&path).unwrap(), record);
    }
}

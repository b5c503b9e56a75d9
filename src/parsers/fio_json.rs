//! fio `--output-format=json` 결과 파서
//!
//! `--group_reporting` 기준으로 첫 번째 job만 사용한다.

use crate::models::ParsedMetrics;
use crate::parsers::units::{bandwidth_factor, round_to};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FioReport {
    #[serde(default)]
    jobs: Vec<FioJob>,
}

#[derive(Debug, Deserialize)]
struct FioJob {
    read: Option<FioDirection>,
    write: Option<FioDirection>,
}

#[derive(Debug, Deserialize)]
struct FioDirection {
    iops: Option<f64>,
    /// KiB/s
    bw: Option<f64>,
    lat_ns: Option<FioLatency>,
}

#[derive(Debug, Deserialize)]
struct FioLatency {
    mean: Option<f64>,
}

impl FioDirection {
    fn mean_latency(&self) -> Option<f64> {
        self.lat_ns.as_ref().and_then(|lat| lat.mean)
    }
}

/// fio JSON 보고서에서 IOPS, 평균 지연(ns), 대역폭(MiB/s) 추출
///
/// 지연은 read IOPS가 0보다 크면 read 쪽, 아니면 write 쪽 평균을 쓴다.
/// 혼합 워크로드에서는 write 비중이 커도 read 지연이 선택된다.
/// 두 방향 값은 `read_latency` / `write_latency`로 따로 남긴다.
pub fn parse_fio_json(text: &str) -> Result<ParsedMetrics, serde_json::Error> {
    // fio는 JSON 앞에 "note: ..." 같은 줄을 찍는 경우가 있음
    let json = match text.find('{') {
        Some(start) => &text[start..],
        None => text,
    };
    let report: FioReport = serde_json::from_str(json)?;

    let Some(job) = report.jobs.first() else {
        return Ok(ParsedMetrics::default());
    };

    let read = job.read.as_ref();
    let write = job.write.as_ref();

    let read_iops = read.and_then(|d| d.iops);
    let write_iops = write.and_then(|d| d.iops);
    let iops = sum_present(read_iops, write_iops);

    let bandwidth = sum_present(read.and_then(|d| d.bw), write.and_then(|d| d.bw))
        .map(|kib| round_to(kib * bandwidth_factor("KiB"), 2));

    let read_latency = read.and_then(FioDirection::mean_latency);
    let write_latency = write.and_then(FioDirection::mean_latency);
    let latency = if read_iops.unwrap_or(0.0) > 0.0 {
        read_latency
    } else {
        write_latency
    };

    Ok(ParsedMetrics {
        iops,
        latency,
        bandwidth,
        read_latency,
        write_latency,
    })
}

// 둘 중 하나라도 있으면 합계, 둘 다 없으면 None
fn sum_present(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANDREAD: &str = r#"{
      "fio version" : "fio-3.36",
      "jobs" : [
        {
          "jobname" : "randread_bs4k",
          "read" : { "iops" : 250000.5, "bw" : 1000002, "lat_ns" : { "min" : 1000, "max" : 90000, "mean" : 3828.91 } },
          "write" : { "iops" : 0.0, "bw" : 0, "lat_ns" : { "min" : 0, "max" : 0, "mean" : 0.0 } }
        }
      ]
    }"#;

    #[test]
    fn test_read_only_job() {
        let metrics = parse_fio_json(RANDREAD).unwrap();
        assert_eq!(metrics.iops, Some(250000.5));
        assert_eq!(metrics.latency, Some(3828.91));
        assert_eq!(metrics.bandwidth, Some(976.56));
    }

    #[test]
    fn test_write_only_job_uses_write_latency() {
        let text = r#"{"jobs":[{"read":{"iops":0.0,"bw":0,"lat_ns":{"mean":0.0}},
                                "write":{"iops":1000.0,"bw":4000,"lat_ns":{"mean":12000.0}}}]}"#;
        let metrics = parse_fio_json(text).unwrap();
        assert_eq!(metrics.iops, Some(1000.0));
        assert_eq!(metrics.latency, Some(12000.0));
        assert_eq!(metrics.bandwidth, Some(3.91));
    }

    #[test]
    fn test_mixed_job_prefers_read_latency() {
        let text = r#"{"jobs":[{"read":{"iops":100.0,"bw":400,"lat_ns":{"mean":5000.0}},
                                "write":{"iops":900.0,"bw":3600,"lat_ns":{"mean":9000.0}}}]}"#;
        let metrics = parse_fio_json(text).unwrap();
        assert_eq!(metrics.iops, Some(1000.0));
        assert_eq!(metrics.latency, Some(5000.0));
        assert_eq!(metrics.read_latency, Some(5000.0));
        assert_eq!(metrics.write_latency, Some(9000.0));
    }

    #[test]
    fn test_preamble_before_json() {
        let text = format!("note: both iodepth >= 1 and synchronous I/O engine are selected\n{RANDREAD}");
        assert_eq!(parse_fio_json(&text).unwrap().iops, Some(250000.5));
    }

    #[test]
    fn test_missing_sections_are_none() {
        let metrics = parse_fio_json(r#"{"jobs":[{"read":{"iops":10.0}}]}"#).unwrap();
        assert_eq!(metrics.iops, Some(10.0));
        assert_eq!(metrics.latency, None);
        assert_eq!(metrics.bandwidth, None);

        assert!(parse_fio_json(r#"{"jobs":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(parse_fio_json("fio: failed to open file").is_err());
    }
}

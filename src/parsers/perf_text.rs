//! 줄 단위 텍스트 출력(SPDK perf 등) 파서
//!
//! 문법:
//! - IOPS: `IOPS = <숫자>[k|M|G]`
//! - 지연: `clat min/avg/max = <min>/<avg>/<max>` 중 avg만 사용
//! - 대역폭: `BW = <숫자><단위>/s` (KiB, MB, GiB ...)
//!
//! 같은 항목이 여러 줄에 나오면 마지막 값이 남는다.

use crate::models::ParsedMetrics;
use crate::parsers::units::{normalize_bandwidth, normalize_number, round_to};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IOPS_RE: Regex = Regex::new(r"IOPS\s*=\s*([\d\.]+)\s*([kKmMgG]?)").unwrap();
    static ref CLAT_RE: Regex = Regex::new(r"clat\s+min/avg/max\s*=\s*\S+/(\S+)/").unwrap();
    static ref BW_RE: Regex = Regex::new(r"BW\s*=\s*([\d\.]+)\s*([A-Za-z]{2,4})/s").unwrap();
}

// 출력 값 소수점 자리수
const METRIC_PRECISION: u32 = 2;

/// 한 줄에서 찾은 지표
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMetrics {
    pub iops: Option<f64>,
    pub latency: Option<f64>,
    pub bandwidth: Option<f64>,
}

/// 한 줄에서 IOPS / 평균 지연 / 대역폭 패턴 검출
pub fn parse_perf_line(line: &str) -> LineMetrics {
    let mut found = LineMetrics::default();

    if let Some(caps) = IOPS_RE.captures(line) {
        found.iops = normalize_number(&caps[1], &caps[2]).map(|v| round_to(v, METRIC_PRECISION));
    }

    if let Some(caps) = CLAT_RE.captures(line) {
        found.latency = caps[1].parse::<f64>().ok();
    }

    if let Some(caps) = BW_RE.captures(line) {
        found.bandwidth =
            normalize_bandwidth(&caps[1], &caps[2]).map(|v| round_to(v, METRIC_PRECISION));
    }

    found
}

/// 전체 출력 텍스트에서 지표 추출. 찾지 못한 항목은 `None`.
pub fn parse_perf_output(output: &str) -> ParsedMetrics {
    let mut metrics = ParsedMetrics::default();

    for line in output.lines() {
        let found = parse_perf_line(line);
        if found.iops.is_some() {
            metrics.iops = found.iops;
        }
        if found.latency.is_some() {
            metrics.latency = found.latency;
        }
        if found.bandwidth.is_some() {
            metrics.bandwidth = found.bandwidth;
        }
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iops_with_suffix() {
        let found = parse_perf_line("  read: IOPS=250k, BW=977MiB/s (1024MB/s)(57.2GiB/60001msec)");
        assert_eq!(found.iops, Some(250000.0));
        assert_eq!(found.bandwidth, Some(977.0));
        assert_eq!(found.latency, None);
    }

    #[test]
    fn test_latency_keeps_average_only() {
        let found = parse_perf_line("     clat min/avg/max = 10.12/35.50/912.00 (usec)");
        assert_eq!(found.latency, Some(35.50));
    }

    #[test]
    fn test_full_report() {
        let output = "\
Initializing NVMe Controllers
Attached to NVMe Controller at 0000:c3:00.0 [144d:a80a]
Total: IOPS = 512.3k
     clat min/avg/max = 8.00/61.20/1024.00 (us)
Total: BW = 2 GiB/s
";
        let metrics = parse_perf_output(output);
        assert_eq!(metrics.iops, Some(512300.0));
        assert_eq!(metrics.latency, Some(61.2));
        assert_eq!(metrics.bandwidth, Some(2048.0));
    }

    #[test]
    fn test_only_bandwidth_line() {
        let metrics = parse_perf_output("Total: BW = 100 KiB/s\n");
        assert_eq!(metrics.iops, None);
        assert_eq!(metrics.latency, None);
        assert_eq!(metrics.bandwidth, Some(0.1));
    }

    #[test]
    fn test_later_lines_override() {
        let output = "IOPS = 100\nIOPS = 200\n";
        assert_eq!(parse_perf_output(output).iops, Some(200.0));
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_perf_output("").is_empty());
        assert!(parse_perf_output("spdk: no devices attached").is_empty());
    }
}

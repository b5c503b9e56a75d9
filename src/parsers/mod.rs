pub mod fio_json;
pub mod perf_text;
pub mod units;

use crate::models::{BenchTool, ParsedMetrics};

pub use fio_json::parse_fio_json;
pub use perf_text::parse_perf_output;
pub use units::{normalize_bandwidth, normalize_number, round_to};

/// 도구 종류에 맞는 파서로 출력 해석
///
/// fio 출력이 JSON이 아니면 텍스트 문법으로 한 번 더 시도한다.
pub fn parse_output(tool: BenchTool, text: &str) -> ParsedMetrics {
    match tool {
        BenchTool::Fio => match parse_fio_json(text) {
            Ok(metrics) => metrics,
            Err(_) => parse_perf_output(text),
        },
        BenchTool::SpdkPerf => parse_perf_output(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fio_falls_back_to_text() {
        let metrics = parse_output(BenchTool::Fio, "  write: IOPS=12.5k, BW=48.8MiB/s (51.2MB/s)");
        assert_eq!(metrics.iops, Some(12500.0));
        assert_eq!(metrics.bandwidth, Some(48.8));
    }

    #[test]
    fn test_spdk_uses_text_parser() {
        let metrics = parse_output(BenchTool::SpdkPerf, "BW = 512 MiB/s");
        assert_eq!(metrics.bandwidth, Some(512.0));
        assert_eq!(metrics.iops, None);
    }
}

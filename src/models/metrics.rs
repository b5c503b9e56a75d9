use serde::{Deserialize, Serialize};

/// 벤치마크 출력에서 뽑아낸 지표
///
/// 출력에 없는 값은 `None`으로 남기며 추정하거나 0으로 채우지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedMetrics {
    /// read + write IOPS
    pub iops: Option<f64>,
    /// 평균 지연 (엔진 고유 단위: fio는 ns, SPDK perf는 us)
    pub latency: Option<f64>,
    /// MiB/s
    pub bandwidth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_latency: Option<f64>,
}

impl ParsedMetrics {
    pub fn is_empty(&self) -> bool {
        self.iops.is_none() && self.latency.is_none() && self.bandwidth.is_none()
    }
}

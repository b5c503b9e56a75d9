use serde::{Deserialize, Serialize};

/// 샘플러가 한 번 측정한 CPU 사용률
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// Unix 시각 (초)
    pub timestamp: f64,
    /// 프로세스 트리 전체의 CPU 사용률 합 (%). 코어 수에 따라 100을 넘을 수 있다.
    pub total_cpu: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_core: Option<Vec<f32>>,
}

/// 트리밍된 CPU 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuSummary {
    pub avg: f64,
    pub total: f64,
    /// 트리밍 전 샘플 수
    pub samples: usize,
}

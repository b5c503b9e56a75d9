use serde::{Deserialize, Serialize};

/// 대상(디바이스 또는 파일)의 프리필 완료 기록
///
/// 쓰기 단계가 성공한 뒤에만 만들어지며, 이후에는 수정하지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefillMarker {
    pub target: String,
    pub size_bytes: u64,
    pub duration_sec: f64,
    /// 완료 시각 (YYYYMMDD_HHMMSS)
    pub timestamp: String,
}

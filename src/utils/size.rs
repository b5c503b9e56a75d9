//! 블록 크기 문자열, 파일명, 타임스탬프 관련 헬퍼

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNSAFE_FILENAME_RE: Regex = Regex::new(r"[^\w\-_.]").unwrap();
}

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// "4k", "1m", "1g", "512" 같은 블록 크기 문자열을 바이트로 변환
///
/// 접미사는 2진 단위(1k = 1024)로 해석한다.
pub fn block_size_to_bytes(bs: &str) -> Option<u64> {
    let bs = bs.trim().to_lowercase();
    let units = [("b", 1), ("k", KIB), ("m", MIB), ("g", GIB)];

    for (suffix, factor) in units {
        if let Some(number) = bs.strip_suffix(suffix) {
            return number.trim().parse::<u64>().ok()?.checked_mul(factor);
        }
    }

    // 접미사가 없으면 바이트 단위
    bs.parse::<u64>().ok()
}

/// 바이트 값을 "4k", "1m" 형태로 되돌림 (나누어 떨어지는 가장 큰 단위 사용)
pub fn bytes_to_human(num_bytes: u64) -> String {
    let thresholds = [("g", GIB), ("m", MIB), ("k", KIB)];
    for (suffix, size) in thresholds {
        if num_bytes >= size && num_bytes % size == 0 {
            return format!("{}{}", num_bytes / size, suffix);
        }
    }
    num_bytes.to_string()
}

/// 파일명으로 쓸 수 없는 문자를 '_'로 치환
pub fn safe_filename(name: &str) -> String {
    UNSAFE_FILENAME_RE.replace_all(name, "_").into_owned()
}

/// 파일명/로그용 현재 시각 (YYYYMMDD_HHMMSS)
pub fn current_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// 장치 경로에서 마지막 구성요소만 추출 ("/dev/nvme0n1" -> "nvme0n1")
pub fn device_basename(device: &str) -> &str {
    device
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(device)
}

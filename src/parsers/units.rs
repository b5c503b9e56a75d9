//! 벤치마크 출력 숫자의 단위 정규화
//!
//! 모르는 단위는 변환 없이 그대로 통과시킨다. 숫자가 아니면 `None`.

/// k/M/G 접미사가 붙은 수를 실수로 변환 (k = 1e3, M = 1e6, G = 1e9)
pub fn normalize_number(value: &str, suffix: &str) -> Option<f64> {
    let value = value.trim().parse::<f64>().ok()?;
    let multiplier = match suffix.trim() {
        "k" | "K" => 1e3,
        "m" | "M" => 1e6,
        "g" | "G" => 1e9,
        _ => 1.0,
    };
    Some(value * multiplier)
}

/// 대역폭 값을 MiB/s로 변환
///
/// 단위 비교는 대소문자를 구분하지 않으며 "i"가 있으면 2진, 없으면 10진 단위.
pub fn normalize_bandwidth(value: &str, unit: &str) -> Option<f64> {
    let value = value.trim().parse::<f64>().ok()?;
    Some(value * bandwidth_factor(unit))
}

const MIB_BYTES: f64 = 1_048_576.0;

/// `unit`을 MiB로 바꾸는 배율. 모르는 단위는 1.0
pub fn bandwidth_factor(unit: &str) -> f64 {
    // "kib"가 "kb"보다, "mib"가 "mb"보다 먼저 검사되어야 함
    const FACTORS: [(&str, f64); 6] = [
        ("kib", 1024.0 / MIB_BYTES),
        ("kb", 1e3 / MIB_BYTES),
        ("mib", 1.0),
        ("mb", 1e6 / MIB_BYTES),
        ("gib", 1024.0),
        ("gb", 1e9 / MIB_BYTES),
    ];

    let unit = unit.trim().to_lowercase();
    FACTORS
        .iter()
        .find(|(prefix, _)| unit.starts_with(prefix))
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

/// 소수점 `places` 자리 반올림
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_number_suffixes() {
        assert_eq!(normalize_number("1.5", "k"), Some(1500.0));
        assert_eq!(normalize_number("2", "M"), Some(2_000_000.0));
        assert_eq!(normalize_number("3", "g"), Some(3e9));
        assert_eq!(normalize_number("42.25", ""), Some(42.25));
        assert_eq!(normalize_number("1.2.3", "k"), None);
    }

    #[test]
    fn test_normalize_bandwidth_binary_units() {
        let kib = normalize_bandwidth("100", "KiB").unwrap();
        assert_eq!(round_to(kib, 4), 0.0977);
        assert_eq!(round_to(kib, 2), 0.1);
        assert_eq!(normalize_bandwidth("2", "GiB"), Some(2048.0));
        assert_eq!(normalize_bandwidth("977", "MiB"), Some(977.0));
    }

    #[test]
    fn test_normalize_bandwidth_decimal_units() {
        // 10진 단위는 바이트로 환산한 뒤 2^20으로 나눈다
        assert_eq!(normalize_bandwidth("1000", "MB"), Some(1e9 / 1_048_576.0));
        assert_eq!(round_to(normalize_bandwidth("1000", "MB").unwrap(), 2), 953.67);
        assert_eq!(round_to(normalize_bandwidth("1000", "kB").unwrap(), 4), 0.9537);
        assert_eq!(round_to(normalize_bandwidth("1", "GB").unwrap(), 2), 953.67);
        assert_eq!(normalize_bandwidth("1048576", "KB"), Some(1000.0));
    }

    #[test]
    fn test_unknown_unit_passes_through() {
        assert_eq!(normalize_bandwidth("12.5", "XB"), Some(12.5));
        assert_eq!(normalize_bandwidth("n/a", "MiB"), None);
    }
}

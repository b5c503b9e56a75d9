// 프리필 순차 쓰기 블록 크기 / 큐 깊이
pub const PREFILL_BLOCK_SIZE: &str = "128k";
pub const PREFILL_QUEUE_DEPTH: u32 = 32;

// SPDK 프리필 시 임시로 붙이는 bdev 이름
pub const TEMP_BDEV_NAME: &str = "prefill_nvme";

// CPU 통계 반올림 자리수
pub const CPU_PRECISION: u32 = 2;

// 샘플러 기본값 (밀리초)
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_SAMPLER_WARMUP_MS: u64 = 500;

// 앞뒤에서 잘라낼 샘플 비율
pub const DEFAULT_TRIM_RATIO: f64 = 0.1;

// 결과 디렉토리 구성
pub const JSON_DIR: &str = "json";
pub const RAW_DIR: &str = "raw";
pub const CPU_TIMELINE_DIR: &str = "cpu";
pub const PARTIAL_CSV_NAME: &str = "partial_results.csv";
pub const EXPORT_PARQUET_NAME: &str = "dse_results.parquet";

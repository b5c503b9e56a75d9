use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// 벤치마크 도구 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchTool {
    Fio,
    SpdkPerf,
}

impl FromStr for BenchTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fio" => Ok(BenchTool::Fio),
            "spdk" | "spdk_perf" | "perf" => Ok(BenchTool::SpdkPerf),
            _ => Err(format!("Unknown benchmark tool: {s}")),
        }
    }
}

impl BenchTool {
    pub fn display_name(&self) -> &'static str {
        match self {
            BenchTool::Fio => "fio",
            BenchTool::SpdkPerf => "spdk_perf",
        }
    }
}

// 블록 디바이스 직접 측정인지, 파일시스템 위의 파일 측정인지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkLevel {
    Block,
    File,
}

impl FromStr for BenchmarkLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" | "raw" => Ok(BenchmarkLevel::Block),
            "file" => Ok(BenchmarkLevel::File),
            _ => Err(format!("Unknown benchmark level: {s}")),
        }
    }
}

/// I/O engine passed to the benchmark tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoEngine {
    Libaio,
    IoUring,
    /// GPUDirect Storage (cuFile) zero-copy path
    Libcufile,
    /// SPDK user-space NVMe driver
    Spdk,
}

impl FromStr for IoEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "libaio" => Ok(IoEngine::Libaio),
            "io_uring" | "iouring" => Ok(IoEngine::IoUring),
            "libcufile" | "cufile" => Ok(IoEngine::Libcufile),
            "spdk" => Ok(IoEngine::Spdk),
            _ => Err(format!("Unknown I/O engine: {s}")),
        }
    }
}

impl IoEngine {
    /// 폴링 옵션(hipri, sqpoll)을 지원하는 엔진인지 여부
    pub fn supports_polling(&self) -> bool {
        matches!(self, IoEngine::IoUring)
    }

    /// fio `--ioengine` 값
    pub fn as_fio_name(&self) -> &'static str {
        match self {
            IoEngine::Libaio => "libaio",
            IoEngine::IoUring => "io_uring",
            IoEngine::Libcufile => "libcufile",
            IoEngine::Spdk => "spdk",
        }
    }
}

impl fmt::Display for IoEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_fio_name())
    }
}

/// I/O completion polling mode. `Full` is hipri and sqpoll together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollMode {
    None,
    Hipri,
    Sqpoll,
    Full,
}

impl FromStr for PollMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(PollMode::None),
            "hipri" => Ok(PollMode::Hipri),
            "sqpoll" => Ok(PollMode::Sqpoll),
            "full" => Ok(PollMode::Full),
            _ => Err(format!("Unknown poll mode: {s}")),
        }
    }
}

impl PollMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollMode::None => "none",
            PollMode::Hipri => "hipri",
            PollMode::Sqpoll => "sqpoll",
            PollMode::Full => "full",
        }
    }

    pub fn uses_hipri(&self) -> bool {
        matches!(self, PollMode::Hipri | PollMode::Full)
    }

    pub fn uses_sqpoll(&self) -> bool {
        matches!(self, PollMode::Sqpoll | PollMode::Full)
    }
}

impl fmt::Display for PollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_parsing() {
        assert_eq!("io_uring".parse::<IoEngine>().unwrap(), IoEngine::IoUring);
        assert_eq!("LIBAIO".parse::<IoEngine>().unwrap(), IoEngine::Libaio);
        assert!("posixaio".parse::<IoEngine>().is_err());
    }

    #[test]
    fn test_only_io_uring_polls() {
        assert!(IoEngine::IoUring.supports_polling());
        assert!(!IoEngine::Libaio.supports_polling());
        assert!(!IoEngine::Libcufile.supports_polling());
    }

    #[test]
    fn test_full_poll_mode_combines_both() {
        assert!(PollMode::Full.uses_hipri());
        assert!(PollMode::Full.uses_sqpoll());
        assert!(!PollMode::Sqpoll.uses_hipri());
        assert!(!PollMode::None.uses_sqpoll());
    }

    #[test]
    fn test_tool_parsing() {
        assert_eq!("spdk".parse::<BenchTool>().unwrap(), BenchTool::SpdkPerf);
        assert_eq!(BenchTool::Fio.display_name(), "fio");
    }
}

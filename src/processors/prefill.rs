//! 프리필(사전 순차 쓰기) 상태 관리
//!
//! 대상마다 `<marker_dir>/<safe_filename(target)>.json` 마커를 하나 둔다.
//! 마커는 쓰기 단계가 성공한 뒤에만 생성되고, 운영자가 명시적으로
//! 무효화하기 전까지 다시 쓰지 않는다.

use crate::models::PrefillMarker;
use crate::parsers::round_to;
use crate::processors::command::{
    blockdev_size_command, fio_prefill_command, spdk_prefill_command, spdk_rpc_command,
    CommandLine,
};
use crate::utils::constants::TEMP_BDEV_NAME;
use crate::utils::size::current_timestamp;
use crate::utils::{bytes_to_human, safe_filename};
use crate::{log, log_error};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrefillError {
    #[error("attach failed for {target}: {reason}")]
    Attach { target: String, reason: String },

    #[error("size query failed for {target}: {reason}")]
    SizeQuery { target: String, reason: String },

    #[error("prefill write failed for {target}: {reason}")]
    Write { target: String, reason: String },

    #[error("failed to write prefill marker for {target}: {source}")]
    Marker {
        target: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrefillStatus {
    /// 마커가 이미 있어 아무것도 쓰지 않음
    AlreadyDone(PrefillMarker),
    Completed(PrefillMarker),
}

impl PrefillStatus {
    pub fn marker(&self) -> &PrefillMarker {
        match self {
            PrefillStatus::AlreadyDone(marker) | PrefillStatus::Completed(marker) => marker,
        }
    }
}

/// 대상 크기 조회와 순차 쓰기를 수행하는 외부 도구
pub trait PrefillBackend {
    /// 쓰기 전에 대상을 준비 (SPDK 컨트롤러 attach 등)
    fn attach(&self, _target: &str) -> Result<(), String> {
        Ok(())
    }

    fn size_bytes(&self, target: &str) -> Result<u64, String>;

    fn write_pass(&self, target: &str, size_bytes: u64) -> Result<(), String>;

    fn detach(&self, _target: &str) -> Result<(), String> {
        Ok(())
    }
}

/// attach 성공 후 생성. 어떤 경로로 빠져나가든 drop 시 detach 한다.
pub struct AttachGuard<'a> {
    backend: &'a dyn PrefillBackend,
    target: &'a str,
}

impl<'a> AttachGuard<'a> {
    pub fn attach(backend: &'a dyn PrefillBackend, target: &'a str) -> Result<Self, PrefillError> {
        backend.attach(target).map_err(|reason| PrefillError::Attach {
            target: target.to_string(),
            reason,
        })?;
        Ok(Self { backend, target })
    }
}

impl Drop for AttachGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.detach(self.target) {
            log_error!("[Prefill] Detach failed for {}: {}", self.target, e);
        }
    }
}

pub struct PrefillTracker {
    marker_dir: PathBuf,
    markers: HashMap<String, PrefillMarker>,
}

impl PrefillTracker {
    /// 마커 디렉토리의 모든 `*.json`을 읽어온다. 읽을 수 없는 마커는 건너뛴다.
    pub fn load(marker_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(marker_dir)?;

        let pattern = marker_dir.join("*.json");
        let pattern = pattern.to_string_lossy();
        let paths = glob::glob(&pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let mut markers = HashMap::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    log_error!("[Prefill] Cannot access marker: {}", e);
                    continue;
                }
            };

            match read_marker(&path) {
                Ok(marker) => {
                    markers.insert(marker.target.clone(), marker);
                }
                Err(e) => log_error!("[Prefill] Ignoring marker {}: {}", path.display(), e),
            }
        }

        Ok(Self {
            marker_dir: marker_dir.to_path_buf(),
            markers,
        })
    }

    pub fn marker_dir(&self) -> &Path {
        &self.marker_dir
    }

    pub fn marker_path(&self, target: &str) -> PathBuf {
        self.marker_dir.join(format!("{}.json", safe_filename(target)))
    }

    pub fn is_prefilled(&self, target: &str) -> Option<&PrefillMarker> {
        self.markers.get(target)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn mark_prefilled(
        &mut self,
        target: &str,
        size_bytes: u64,
        duration_sec: f64,
    ) -> io::Result<PrefillMarker> {
        let marker = PrefillMarker {
            target: target.to_string(),
            size_bytes,
            duration_sec: round_to(duration_sec, 2),
            timestamp: current_timestamp(),
        };

        let json = serde_json::to_string_pretty(&marker)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.marker_path(target), json)?;

        self.markers.insert(target.to_string(), marker.clone());
        Ok(marker)
    }

    /// 운영자 요청으로 마커 삭제. 마커가 있었으면 true.
    pub fn invalidate(&mut self, target: &str) -> io::Result<bool> {
        let path = self.marker_path(target);
        let existed_on_disk = if path.exists() {
            fs::remove_file(&path)?;
            true
        } else {
            false
        };
        let existed_in_memory = self.markers.remove(target).is_some();
        Ok(existed_on_disk || existed_in_memory)
    }

    pub fn prefill(
        &mut self,
        target: &str,
        force: bool,
        backend: &dyn PrefillBackend,
    ) -> Result<PrefillStatus, PrefillError> {
        log!("[Prefill] Requested prefill: {}", target);

        if !force {
            if let Some(marker) = self.is_prefilled(target) {
                log!(
                    "[Prefill] Already prefilled at {} ({}), skipping",
                    marker.timestamp,
                    self.marker_path(target).display()
                );
                return Ok(PrefillStatus::AlreadyDone(marker.clone()));
            }
        }

        let (size_bytes, elapsed) = {
            let _guard = AttachGuard::attach(backend, target)?;

            let size_bytes = backend
                .size_bytes(target)
                .map_err(|reason| PrefillError::SizeQuery {
                    target: target.to_string(),
                    reason,
                })?;
            log!(
                "[Prefill] {} size: {} bytes ({})",
                target,
                size_bytes,
                bytes_to_human(size_bytes)
            );

            let start = Instant::now();
            backend
                .write_pass(target, size_bytes)
                .map_err(|reason| PrefillError::Write {
                    target: target.to_string(),
                    reason,
                })?;
            (size_bytes, start.elapsed().as_secs_f64())
        };

        let marker = self
            .mark_prefilled(target, size_bytes, elapsed)
            .map_err(|source| PrefillError::Marker {
                target: target.to_string(),
                source,
            })?;
        log!("[Prefill] {} complete in {:.2}s", target, marker.duration_sec);

        Ok(PrefillStatus::Completed(marker))
    }
}

fn read_marker(path: &Path) -> io::Result<PrefillMarker> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// 여러 대상을 순서대로 프리필하고 대상별 결과를 돌려준다
///
/// 한 번에 한 대상씩, 호출한 스레드에서 실행한다.
pub fn prefill_many(
    tracker: &mut PrefillTracker,
    targets: &[String],
    force: bool,
    backend: &dyn PrefillBackend,
) -> Vec<(String, Result<PrefillStatus, PrefillError>)> {
    targets
        .iter()
        .map(|target| {
            let result = tracker.prefill(target, force, backend);
            if let Err(e) = &result {
                log_error!("[Prefill] {}", e);
            }
            (target.clone(), result)
        })
        .collect()
}

// 종료 코드가 0이 아니면 stderr 내용을 에러로
fn run_checked(cmd: &CommandLine) -> Result<String, String> {
    log!("[Prefill] Running: {}", cmd);
    let output = cmd
        .to_command()
        .output()
        .map_err(|e| format!("failed to launch {}: {}", cmd.program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} exited with {}: {}", cmd.program, output.status, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// 블록 디바이스 또는 미리 만들어 둔 테스트 파일을 fio로 채운다
pub struct FioPrefill {
    pub fio_command: Vec<String>,
    pub use_direct: bool,
}

impl PrefillBackend for FioPrefill {
    fn size_bytes(&self, target: &str) -> Result<u64, String> {
        let metadata = fs::metadata(target).map_err(|e| e.to_string())?;
        if metadata.is_file() {
            return Ok(metadata.len());
        }

        let stdout = run_checked(&blockdev_size_command(target))?;
        stdout
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("unexpected blockdev output '{}': {}", stdout.trim(), e))
    }

    fn write_pass(&self, target: &str, size_bytes: u64) -> Result<(), String> {
        let cmd = fio_prefill_command(&self.fio_command, target, size_bytes, self.use_direct);
        run_checked(&cmd).map(|_| ())
    }
}

/// 사용자 공간 NVMe 컨트롤러를 임시 bdev로 붙여 크기를 읽고 perf로 채운다
pub struct SpdkPrefill {
    pub spdk_dir: PathBuf,
    pub runtime_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct BdevInfo {
    name: String,
    num_blocks: u64,
    block_size: u64,
}

/// `bdev_get_bdevs` 출력에서 이름이 prefix로 시작하는 bdev의 크기
pub fn parse_bdev_size(json: &str, name_prefix: &str) -> Result<u64, String> {
    let bdevs: Vec<BdevInfo> = serde_json::from_str(json).map_err(|e| e.to_string())?;
    bdevs
        .iter()
        .find(|bdev| bdev.name.starts_with(name_prefix))
        .map(|bdev| bdev.num_blocks * bdev.block_size)
        .ok_or_else(|| format!("no bdev named {name_prefix}* reported by SPDK"))
}

impl PrefillBackend for SpdkPrefill {
    fn attach(&self, target: &str) -> Result<(), String> {
        let cmd = spdk_rpc_command(
            &self.spdk_dir,
            &["bdev_nvme_attach_controller", "-b", TEMP_BDEV_NAME, "-t", "PCIe", "-a", target],
        );
        run_checked(&cmd).map(|_| ())
    }

    fn size_bytes(&self, _target: &str) -> Result<u64, String> {
        let stdout = run_checked(&spdk_rpc_command(&self.spdk_dir, &["bdev_get_bdevs"]))?;
        parse_bdev_size(&stdout, TEMP_BDEV_NAME)
    }

    fn write_pass(&self, target: &str, _size_bytes: u64) -> Result<(), String> {
        let cmd = spdk_prefill_command(&self.spdk_dir, target, self.runtime_seconds);
        run_checked(&cmd).map(|_| ())
    }

    fn detach(&self, _target: &str) -> Result<(), String> {
        let cmd = spdk_rpc_command(
            &self.spdk_dir,
            &["bdev_nvme_detach_controller", "-b", TEMP_BDEV_NAME],
        );
        run_checked(&cmd).map(|_| ())
    }
}

use crate::models::{IoEngine, PollMode};
use crate::utils::size::{block_size_to_bytes, device_basename, safe_filename};
use serde::{Deserialize, Serialize};

/// 워크로드 정의 (설정 파일에서 읽는 정적 데이터)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadDescriptor {
    pub name: String,
    /// fio `--rw` / SPDK perf `-w` 값 (randread, randwrite, randrw ...)
    pub rw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rwmixread: Option<u8>,
    /// 측정 전에 대상 전체를 순차 쓰기로 채워야 하는지 여부
    #[serde(default)]
    pub needs_prefill: bool,
}

impl WorkloadDescriptor {
    pub fn new(name: &str, rw: &str, rwmixread: Option<u8>, needs_prefill: bool) -> Self {
        Self {
            name: name.to_string(),
            rw: rw.to_string(),
            rwmixread,
            needs_prefill,
        }
    }
}

/// 파라미터 그리드의 한 점. 생성 후에는 변경되지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSpec {
    device: String,
    filesystem: String,
    workload: WorkloadDescriptor,
    block_size: String,
    engine: IoEngine,
    poll: PollMode,
    queue_depth: u32,
    numjobs: u32,
    gpu_id: Option<u32>,
}

impl JobSpec {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &str,
        filesystem: &str,
        workload: WorkloadDescriptor,
        block_size: &str,
        engine: IoEngine,
        poll: PollMode,
        queue_depth: u32,
        numjobs: u32,
        gpu_id: Option<u32>,
    ) -> Result<Self, String> {
        if device.trim().is_empty() {
            return Err("device must not be empty".to_string());
        }
        if queue_depth == 0 {
            return Err(format!("queue depth must be positive for {device}"));
        }
        if numjobs == 0 {
            return Err(format!("numjobs must be positive for {device}"));
        }
        if block_size_to_bytes(block_size).is_none() {
            return Err(format!("invalid block size: {block_size}"));
        }

        Ok(Self {
            device: device.to_string(),
            filesystem: filesystem.to_string(),
            workload,
            block_size: block_size.to_string(),
            engine,
            poll,
            queue_depth,
            numjobs,
            gpu_id,
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn filesystem(&self) -> &str {
        &self.filesystem
    }

    pub fn workload(&self) -> &WorkloadDescriptor {
        &self.workload
    }

    pub fn block_size(&self) -> &str {
        &self.block_size
    }

    pub fn block_size_bytes(&self) -> u64 {
        // new()에서 검증했으므로 항상 Some
        block_size_to_bytes(&self.block_size).unwrap_or(0)
    }

    pub fn engine(&self) -> IoEngine {
        self.engine
    }

    pub fn poll(&self) -> PollMode {
        self.poll
    }

    pub fn queue_depth(&self) -> u32 {
        self.queue_depth
    }

    pub fn numjobs(&self) -> u32 {
        self.numjobs
    }

    pub fn gpu_id(&self) -> Option<u32> {
        self.gpu_id
    }

    /// 결과 식별자. 같은 필드 값이면 항상 같은 이름이 나온다.
    pub fn job_name(&self) -> String {
        let mix = self
            .workload
            .rwmixread
            .map(|m| format!("_mix{m}"))
            .unwrap_or_default();
        let gpu = self.gpu_id.map(|g| format!("_gpu{g}")).unwrap_or_default();

        format!(
            "{}{}_bs{}_eng{}_poll{}_qd{}_nj{}_{}_{}{}",
            self.workload.name,
            mix,
            self.block_size,
            self.engine,
            self.poll,
            self.queue_depth,
            self.numjobs,
            self.filesystem,
            device_basename(&self.device),
            gpu
        )
    }

    /// 결과 파일 이름에 쓰는 안전한 job 이름
    pub fn file_stem(&self) -> String {
        safe_filename(&self.job_name())
    }
}

//! 파라미터 그리드 열거
//!
//! 축 순서(바깥 → 안쪽): device → filesystem → workload → block size →
//! engine → poll → queue depth → numjobs → gpu. 같은 설정이면 항상 같은
//! 순서로 같은 JobSpec이 나오므로, 결과 파일 존재 여부로 재개할 수 있다.

use crate::models::{BenchTool, BenchmarkLevel, IoEngine, JobSpec, PollMode, WorkloadDescriptor};
use crate::utils::CampaignConfig;

const AXIS_COUNT: usize = 9;

/// 순서가 정해진 축 목록
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    pub level: BenchmarkLevel,
    pub devices: Vec<String>,
    pub filesystems: Vec<String>,
    pub workloads: Vec<WorkloadDescriptor>,
    pub block_sizes: Vec<String>,
    pub engines: Vec<IoEngine>,
    pub poll_modes: Vec<PollMode>,
    pub queue_depths: Vec<u32>,
    pub numjobs: Vec<u32>,
    /// 비어 있으면 GPU 없음(None) 하나로 취급
    pub gpu_ids: Vec<u32>,
}

impl GridAxes {
    pub fn from_config(config: &CampaignConfig) -> Self {
        // SPDK perf는 엔진/폴링 선택지가 없다
        let (engines, poll_modes) = match config.tool {
            BenchTool::SpdkPerf => (vec![IoEngine::Spdk], vec![PollMode::None]),
            BenchTool::Fio => (
                config
                    .io_engines
                    .iter()
                    .copied()
                    .filter(|e| *e != IoEngine::Spdk)
                    .collect(),
                config.poll_modes.clone(),
            ),
        };

        Self {
            level: config.level,
            devices: config.devices.clone(),
            filesystems: config.filesystem_axis(),
            workloads: config.workloads.clone(),
            block_sizes: config.block_sizes.clone(),
            engines,
            poll_modes,
            queue_depths: config.queue_depths.clone(),
            numjobs: config.numjobs.clone(),
            gpu_ids: config.gpu_ids.clone(),
        }
    }

    fn gpu_axis(&self) -> Vec<Option<u32>> {
        if self.gpu_ids.is_empty() {
            vec![None]
        } else {
            self.gpu_ids.iter().copied().map(Some).collect()
        }
    }

    fn lengths(&self, gpu_len: usize) -> [usize; AXIS_COUNT] {
        [
            self.devices.len(),
            self.filesystems.len(),
            self.workloads.len(),
            self.block_sizes.len(),
            self.engines.len(),
            self.poll_modes.len(),
            self.queue_depths.len(),
            self.numjobs.len(),
            gpu_len,
        ]
    }
}

/// 엔진/폴링/디바이스 조합이 측정 가능한지 판단
pub fn is_valid_combination(
    level: BenchmarkLevel,
    device: &str,
    engine: IoEngine,
    poll: PollMode,
) -> bool {
    if poll != PollMode::None && !engine.supports_polling() {
        return false;
    }
    // cuFile은 파일시스템 경로가 필요하다
    if level == BenchmarkLevel::Block && engine == IoEngine::Libcufile {
        return false;
    }
    // pmem은 완료 폴링을 지원하지 않는다
    if device.starts_with("/dev/pmem") && poll.uses_hipri() {
        return false;
    }
    true
}

/// 그리드의 JobSpec을 지연 생성하는 반복자
pub struct GridIter<'a> {
    axes: &'a GridAxes,
    gpus: Vec<Option<u32>>,
    lengths: [usize; AXIS_COUNT],
    cursor: [usize; AXIS_COUNT],
    exhausted: bool,
}

impl<'a> GridIter<'a> {
    fn new(axes: &'a GridAxes) -> Self {
        let gpus = axes.gpu_axis();
        let lengths = axes.lengths(gpus.len());
        let exhausted = lengths.iter().any(|&len| len == 0);
        Self {
            axes,
            gpus,
            lengths,
            cursor: [0; AXIS_COUNT],
            exhausted,
        }
    }

    // 가장 안쪽 축부터 한 칸 전진 (오도미터 방식)
    fn advance(&mut self) {
        for axis in (0..AXIS_COUNT).rev() {
            self.cursor[axis] += 1;
            if self.cursor[axis] < self.lengths[axis] {
                return;
            }
            self.cursor[axis] = 0;
        }
        self.exhausted = true;
    }

    fn current(&self) -> Option<JobSpec> {
        let [d, f, w, b, e, p, q, n, g] = self.cursor;
        let axes = self.axes;
        let device = &axes.devices[d];
        let engine = axes.engines[e];
        let poll = axes.poll_modes[p];

        if !is_valid_combination(axes.level, device, engine, poll) {
            return None;
        }

        // 0 큐 깊이나 잘못된 블록 크기 같은 점도 그리드에서 제외
        JobSpec::new(
            device,
            &axes.filesystems[f],
            axes.workloads[w].clone(),
            &axes.block_sizes[b],
            engine,
            poll,
            axes.queue_depths[q],
            axes.numjobs[n],
            self.gpus[g],
        )
        .ok()
    }
}

impl Iterator for GridIter<'_> {
    type Item = JobSpec;

    fn next(&mut self) -> Option<JobSpec> {
        while !self.exhausted {
            let job = self.current();
            self.advance();
            if job.is_some() {
                return job;
            }
        }
        None
    }
}

pub fn points(axes: &GridAxes) -> GridIter<'_> {
    GridIter::new(axes)
}

/// 필터를 통과한 그리드 점의 수
pub fn total_tests(axes: &GridAxes) -> usize {
    points(axes).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_axes() -> GridAxes {
        GridAxes {
            level: BenchmarkLevel::Block,
            devices: vec!["/dev/nvme0n1".to_string()],
            filesystems: vec!["raw".to_string()],
            workloads: vec![WorkloadDescriptor::new("randread", "randread", None, true)],
            block_sizes: vec!["4k".to_string()],
            engines: vec![IoEngine::IoUring, IoEngine::Libaio],
            poll_modes: vec![PollMode::None, PollMode::Hipri],
            queue_depths: vec![1],
            numjobs: vec![1],
            gpu_ids: vec![],
        }
    }

    #[test]
    fn test_poll_filter_example() {
        let axes = single_axes();
        let combos: Vec<(IoEngine, PollMode)> =
            points(&axes).map(|job| (job.engine(), job.poll())).collect();
        assert_eq!(
            combos,
            vec![
                (IoEngine::IoUring, PollMode::None),
                (IoEngine::IoUring, PollMode::Hipri),
                (IoEngine::Libaio, PollMode::None),
            ]
        );
        assert_eq!(total_tests(&axes), 3);
    }

    #[test]
    fn test_cardinality_scales_with_axes() {
        let mut axes = single_axes();
        axes.block_sizes = vec!["4k".to_string(), "128k".to_string()];
        axes.queue_depths = vec![1, 8, 32];
        axes.numjobs = vec![1, 4];
        // (3 유효 엔진/폴링 조합) x 2 x 3 x 2
        assert_eq!(total_tests(&axes), 36);
    }

    #[test]
    fn test_enumeration_is_deterministic_and_restartable() {
        let axes = single_axes();
        let first: Vec<String> = points(&axes).map(|j| j.job_name()).collect();
        let second: Vec<String> = points(&axes).map(|j| j.job_name()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_innermost_axis_varies_fastest() {
        let mut axes = single_axes();
        axes.engines = vec![IoEngine::Libaio];
        axes.poll_modes = vec![PollMode::None];
        axes.queue_depths = vec![1, 2];
        axes.numjobs = vec![1, 2];
        let pairs: Vec<(u32, u32)> = points(&axes)
            .map(|j| (j.queue_depth(), j.numjobs()))
            .collect();
        assert_eq!(pairs, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let mut axes = single_axes();
        axes.queue_depths.clear();
        assert_eq!(total_tests(&axes), 0);
    }

    #[test]
    fn test_pmem_excludes_hipri_and_full() {
        assert!(!is_valid_combination(BenchmarkLevel::Block, "/dev/pmem0", IoEngine::IoUring, PollMode::Hipri));
        assert!(!is_valid_combination(BenchmarkLevel::Block, "/dev/pmem0", IoEngine::IoUring, PollMode::Full));
        assert!(is_valid_combination(BenchmarkLevel::Block, "/dev/pmem0", IoEngine::IoUring, PollMode::Sqpoll));
    }

    #[test]
    fn test_cufile_only_at_file_level() {
        assert!(!is_valid_combination(BenchmarkLevel::Block, "/dev/nvme0n1", IoEngine::Libcufile, PollMode::None));
        assert!(is_valid_combination(BenchmarkLevel::File, "/dev/nvme0n1", IoEngine::Libcufile, PollMode::None));
    }

    #[test]
    fn test_gpu_axis_product() {
        let mut axes = single_axes();
        axes.level = BenchmarkLevel::File;
        axes.filesystems = vec!["xfs".to_string()];
        axes.engines = vec![IoEngine::Libcufile];
        axes.poll_modes = vec![PollMode::None];
        axes.gpu_ids = vec![0, 1];
        let names: Vec<String> = points(&axes).map(|j| j.job_name()).collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("_gpu0"));
        assert!(names[1].ends_with("_gpu1"));
    }

    #[test]
    fn test_spdk_axes_from_config() {
        let mut config = CampaignConfig::default();
        config.tool = BenchTool::SpdkPerf;
        config.devices = vec!["0000:c3:00.0".to_string()];
        let axes = GridAxes::from_config(&config);
        assert_eq!(axes.engines, vec![IoEngine::Spdk]);
        assert_eq!(axes.poll_modes, vec![PollMode::None]);
        // 5 workloads x 3 bs x 5 qd x 5 nj
        assert_eq!(total_tests(&axes), 375);
    }
}

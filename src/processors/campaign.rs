//! 캠페인 전체 실행
//!
//! 그리드를 순서대로 돌며 필요한 경우 프리필을 먼저 수행하고, 작업마다
//! 결과 행을 즉시 CSV에 덧붙인다. 중단 후 다시 실행하면 결과 파일이 있는
//! 작업은 건너뛴다.

use crate::models::{BenchTool, BenchmarkLevel, JobSpec, ResultRecord};
use crate::output::{print_summary, save_results_to_parquet, ResultStore};
use crate::processors::executor::{ExecutorOptions, JobExecutor, JobOutcome};
use crate::processors::grid::{points, total_tests, GridAxes};
use crate::processors::prefill::{FioPrefill, PrefillBackend, PrefillTracker, SpdkPrefill};
use crate::utils::constants::EXPORT_PARQUET_NAME;
use crate::utils::{device_basename, CampaignConfig, PrefillFailurePolicy};
use crate::{log, log_error};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;

/// 이번 실행에서 대상별 프리필 결과
#[derive(Debug, Clone, PartialEq)]
pub enum PrefillState {
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CampaignSummary {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// 건너뛴 작업 중 CSV 행을 결과 파일에서 복구한 수
    pub recovered: usize,
}

/// 측정 대상 경로
///
/// 블록 레벨은 디바이스(SPDK는 PCIe 주소) 그대로, 파일 레벨은
/// `<mount_base>/<device>_<fs>/<test_file_name>` (외부에서 미리 준비).
pub fn resolve_target(config: &CampaignConfig, job: &JobSpec) -> String {
    match config.level {
        BenchmarkLevel::Block => job.device().to_string(),
        BenchmarkLevel::File => config
            .mount_base
            .join(format!("{}_{}", device_basename(job.device()), job.filesystem()))
            .join(&config.test_file_name)
            .display()
            .to_string(),
    }
}

/// 설정의 도구에 맞는 프리필 방식
pub fn default_prefill_backend(config: &CampaignConfig) -> Box<dyn PrefillBackend> {
    match config.tool {
        BenchTool::Fio => Box::new(FioPrefill {
            fio_command: config.fio_command.clone(),
            use_direct: config.use_direct,
        }),
        BenchTool::SpdkPerf => Box::new(SpdkPrefill {
            spdk_dir: config.spdk_dir.clone(),
            runtime_seconds: config.prefill_runtime_seconds,
        }),
    }
}

pub struct Campaign {
    config: CampaignConfig,
    executor: JobExecutor,
    tracker: PrefillTracker,
    backend: Box<dyn PrefillBackend>,
    store: ResultStore,
    prefill_state: HashMap<String, PrefillState>,
    // CSV에 이미 있는 jobname. 읽지 못했으면 None (복구하지 않음)
    stored_jobs: Option<HashSet<String>>,
    records: Vec<ResultRecord>,
    dry_run: bool,
}

impl Campaign {
    pub fn new(
        config: CampaignConfig,
        executor: JobExecutor,
        tracker: PrefillTracker,
        backend: Box<dyn PrefillBackend>,
        store: ResultStore,
    ) -> Self {
        Self {
            config,
            executor,
            tracker,
            backend,
            store,
            prefill_state: HashMap::new(),
            stored_jobs: None,
            records: Vec::new(),
            dry_run: false,
        }
    }

    /// 설정만으로 실행기/마커/저장소를 구성
    pub fn from_config(config: CampaignConfig) -> io::Result<Self> {
        fs::create_dir_all(&config.results_dir)?;
        let executor = JobExecutor::new(ExecutorOptions::from_config(&config));
        let tracker = PrefillTracker::load(&config.marker_dir)?;
        let backend = default_prefill_backend(&config);
        let store = ResultStore::new(&config.results_dir);
        Ok(Self::new(config, executor, tracker, backend, store))
    }

    /// 외부 프로세스 없이 명령줄만 출력
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn prefill_state(&self, target: &str) -> Option<&PrefillState> {
        self.prefill_state.get(target)
    }

    // 대상당 한 번만 트래커를 부른다
    fn ensure_prefilled(&mut self, target: &str) -> PrefillState {
        if let Some(state) = self.prefill_state.get(target) {
            return state.clone();
        }

        let state = match self
            .tracker
            .prefill(target, self.config.force_prefill, self.backend.as_ref())
        {
            Ok(_) => PrefillState::Ready,
            Err(e) => {
                log_error!("{}", e);
                PrefillState::Failed(e.to_string())
            }
        };
        self.prefill_state.insert(target.to_string(), state.clone());
        state
    }

    fn run_point(&mut self, test_id: usize, job: &JobSpec, target: &str) -> JobOutcome {
        let resumable = self.config.enable_resume && self.executor.is_done(job);

        if self.dry_run {
            if resumable {
                log!("[dry-run] {} already done", job.job_name());
            } else {
                log!("[dry-run] {}", self.executor.build_command(job, target));
            }
            return JobOutcome::Skipped;
        }

        if !resumable && job.workload().needs_prefill {
            if let PrefillState::Failed(reason) = self.ensure_prefilled(target) {
                match self.config.on_prefill_failure {
                    PrefillFailurePolicy::Continue => {
                        log!("Prefill failed for {}, measuring anyway", target);
                    }
                    PrefillFailurePolicy::Skip => {
                        log_error!("[{}] Skipped: target was not prefilled", job.job_name());
                        return JobOutcome::Failed(format!("prefill failed: {reason}"));
                    }
                }
            }
        }

        self.executor.execute(test_id, job, target)
    }

    fn load_stored_jobs(&mut self) {
        self.stored_jobs = match self.store.read_records() {
            Ok(records) => Some(records.into_iter().map(|r| r.jobname).collect()),
            Err(e) => {
                log_error!("Cannot read {}: {}", self.store.path().display(), e);
                None
            }
        };
    }

    fn append_record(&mut self, record: ResultRecord) -> bool {
        let appended = match self.store.append(&record) {
            Ok(()) => {
                if let Some(stored) = self.stored_jobs.as_mut() {
                    stored.insert(record.jobname.clone());
                }
                true
            }
            Err(e) => {
                log_error!(
                    "[{}] Failed to append to {}: {}",
                    record.jobname,
                    self.store.path().display(),
                    e
                );
                false
            }
        };
        self.records.push(record);
        appended
    }

    // 결과 파일은 있지만 CSV 행이 없는 작업 (행 추가 전에 중단된 경우 등)
    fn backfill_row(&mut self, test_id: usize, job: &JobSpec) -> bool {
        let jobname = job.job_name();
        match &self.stored_jobs {
            Some(stored) if !stored.contains(&jobname) => {}
            _ => return false,
        }

        match self.executor.recover_record(test_id, job) {
            Ok(record) => {
                let appended = self.append_record(record);
                if appended {
                    log!("[{}] Result row recovered from existing result file", jobname);
                }
                appended
            }
            Err(e) => {
                log_error!("[{}] Cannot recover result row: {}", jobname, e);
                false
            }
        }
    }

    pub fn run(&mut self) -> io::Result<CampaignSummary> {
        fs::create_dir_all(&self.config.results_dir)?;
        for warning in self.config.warnings() {
            log!("Warning: {}", warning);
        }

        if !self.dry_run {
            self.load_stored_jobs();
        }

        let axes = GridAxes::from_config(&self.config);
        let total = total_tests(&axes);
        let mut summary = CampaignSummary {
            total,
            ..Default::default()
        };

        log!(
            "Campaign '{}' ({}, {:?} level): {} test cases",
            self.config.tag,
            self.config.tool.display_name(),
            self.config.level,
            total
        );

        for (index, job) in points(&axes).enumerate() {
            let test_id = index + 1;
            let target = resolve_target(&self.config, &job);
            log!("Case {}/{} is running: {}", test_id, total, job.job_name());

            match self.run_point(test_id, &job, &target) {
                JobOutcome::Completed(record) => {
                    summary.completed += 1;
                    self.append_record(record);
                }
                JobOutcome::Skipped => {
                    summary.skipped += 1;
                    if !self.dry_run && self.backfill_row(test_id, &job) {
                        summary.recovered += 1;
                    }
                }
                JobOutcome::Failed(_) => summary.failed += 1,
            }

            let percent = test_id as f64 / total.max(1) as f64 * 100.0;
            log!("Progress: {}/{} ({:.1}%)\n", test_id, total, percent);
        }

        log!(
            "Campaign finished: {} completed, {} skipped ({} rows recovered), {} failed (total {})",
            summary.completed,
            summary.skipped,
            summary.recovered,
            summary.failed,
            summary.total
        );

        if !self.dry_run {
            self.finish();
        }
        Ok(summary)
    }

    // CSV에 쌓인 전체 결과(이전 실행 포함)로 내보내기와 요약
    fn finish(&self) {
        let all_records = match self.store.read_records() {
            Ok(records) => records,
            Err(e) => {
                log_error!("Cannot read {}: {}", self.store.path().display(), e);
                self.records.clone()
            }
        };

        if self.config.export_parquet {
            let path = self.config.results_dir.join(EXPORT_PARQUET_NAME);
            if let Err(e) = save_results_to_parquet(&all_records, &path) {
                log_error!("Parquet export failed: {}", e);
            }
        }

        print_summary(&all_records);
    }
}

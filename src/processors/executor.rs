//! 그리드 점 하나를 실행하는 작업 실행기
//!
//! 순서: 재개 확인 → 명령 실행 → 샘플러 시작 → 종료 대기 → 샘플러 정지/join →
//! 출력 해석 → 결과 저장. 실패는 `JobOutcome::Failed`로 돌려주고 캠페인은 계속된다.

use crate::models::{BenchTool, CpuSummary, JobSpec, ParsedMetrics, ResultRecord};
use crate::output::{read_record_json, save_cpu_timeline, write_record_json};
use crate::parsers::{parse_fio_json, parse_perf_output};
use crate::processors::command::{fio_job_command, spdk_perf_command, CommandLine};
use crate::processors::sampler::{
    summarize_samples, ResourceSampler, SamplerOptions, SysinfoProbe,
};
use crate::utils::constants::{CPU_TIMELINE_DIR, JSON_DIR, RAW_DIR};
use crate::utils::{CampaignConfig, SamplerConfig};
use crate::{log, log_error};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use thiserror::Error;

// 에러 메시지에 남길 stderr 최대 길이
const STDERR_TAIL_CHARS: usize = 512;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to read result {path}: {source}")]
    ReadArtifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid result report {path}: {source}")]
    ParseArtifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// 결과 파일이 이미 있어 실행하지 않음
    Skipped,
    Completed(ResultRecord),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub tool: BenchTool,
    pub results_dir: PathBuf,
    pub fio_command: Vec<String>,
    pub spdk_dir: PathBuf,
    pub runtime_seconds: u64,
    pub use_direct: bool,
    pub resume: bool,
    pub sampler: SamplerConfig,
    pub save_raw_output: bool,
}

impl ExecutorOptions {
    pub fn from_config(config: &CampaignConfig) -> Self {
        Self {
            tool: config.tool,
            results_dir: config.results_dir.clone(),
            fio_command: config.fio_command.clone(),
            spdk_dir: config.spdk_dir.clone(),
            runtime_seconds: config.runtime_seconds,
            use_direct: config.use_direct,
            resume: config.enable_resume,
            sampler: config.sampler.clone(),
            save_raw_output: config.save_raw_output,
        }
    }
}

/// 결과 파일이 존재하고 비어 있지 않으면 완료된 작업
pub fn is_job_done(artifact: &Path) -> bool {
    fs::metadata(artifact)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    let skip = stderr.chars().count().saturating_sub(STDERR_TAIL_CHARS);
    stderr.chars().skip(skip).collect()
}

fn persist(path: &Path, contents: &str) -> Result<(), ExecError> {
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    };
    write().map_err(|source| ExecError::Persist {
        path: path.to_path_buf(),
        source,
    })
}

pub struct JobExecutor {
    options: ExecutorOptions,
}

impl JobExecutor {
    pub fn new(options: ExecutorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    pub fn artifact_path(&self, job: &JobSpec) -> PathBuf {
        self.options
            .results_dir
            .join(JSON_DIR)
            .join(format!("{}.json", job.file_stem()))
    }

    pub fn raw_output_path(&self, job: &JobSpec) -> PathBuf {
        self.options
            .results_dir
            .join(RAW_DIR)
            .join(format!("{}.txt", job.file_stem()))
    }

    pub fn is_done(&self, job: &JobSpec) -> bool {
        is_job_done(&self.artifact_path(job))
    }

    /// 도구별 명령줄. fio는 JSON 보고서를 결과 파일 경로에 직접 쓴다.
    pub fn build_command(&self, job: &JobSpec, target: &str) -> CommandLine {
        match self.options.tool {
            BenchTool::Fio => fio_job_command(
                &self.options.fio_command,
                job,
                target,
                self.options.runtime_seconds,
                self.options.use_direct,
                &self.artifact_path(job),
            ),
            BenchTool::SpdkPerf => spdk_perf_command(
                &self.options.spdk_dir,
                job,
                target,
                self.options.runtime_seconds,
            ),
        }
    }

    pub fn execute(&self, test_id: usize, job: &JobSpec, target: &str) -> JobOutcome {
        let jobname = job.job_name();

        if self.options.resume && self.is_done(job) {
            log!("Skipping {} (result already exists)", jobname);
            return JobOutcome::Skipped;
        }

        match self.run(test_id, job, target) {
            Ok(record) => JobOutcome::Completed(record),
            Err(e) => {
                log_error!("[{}] {}", jobname, e);
                JobOutcome::Failed(e.to_string())
            }
        }
    }

    fn run(&self, test_id: usize, job: &JobSpec, target: &str) -> Result<ResultRecord, ExecError> {
        let artifact = self.artifact_path(job);
        if let Some(parent) = artifact.parent() {
            fs::create_dir_all(parent).map_err(|source| ExecError::Persist {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let cmd = self.build_command(job, target);
        log!("Running: {}", cmd);

        let child = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Launch {
                program: cmd.program.clone(),
                source,
            })?;

        let sampler_options = SamplerOptions::from(&self.options.sampler);
        let sampler = match ResourceSampler::spawn(child.id(), sampler_options, SysinfoProbe::new()) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log_error!("[{}] CPU sampler not started: {}", job.job_name(), e);
                None
            }
        };

        // stdout/stderr를 모두 읽으면서 종료를 기다린다
        let waited = child.wait_with_output();
        let samples = sampler.map(|handle| handle.stop()).unwrap_or_default();
        let output = waited.map_err(|source| ExecError::Launch {
            program: cmd.program.clone(),
            source,
        })?;

        let cpu = summarize_samples(&samples, self.options.sampler.trim_ratio);
        if self.options.sampler.save_timeline && !samples.is_empty() {
            let dir = self.options.results_dir.join(CPU_TIMELINE_DIR);
            if let Err(e) = save_cpu_timeline(&samples, &dir, &job.file_stem()) {
                log_error!("[{}] Failed to save CPU timeline: {}", job.job_name(), e);
            }
        }

        if !output.status.success() {
            if self.options.tool == BenchTool::Fio {
                // 중단된 보고서가 남으면 재개 시 완료로 오인된다
                remove_stale_artifact(&artifact);
            }
            return Err(ExecError::ExitStatus {
                program: cmd.program.clone(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output),
            });
        }

        let metrics = match self.options.tool {
            BenchTool::Fio => self.read_fio_report(&artifact)?,
            BenchTool::SpdkPerf => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if self.options.save_raw_output {
                    persist(&self.raw_output_path(job), &stdout)?;
                }
                parse_perf_output(&stdout)
            }
        };

        if metrics.is_empty() {
            log_error!(
                "[{}] No IOPS/latency/bandwidth found in benchmark output",
                job.job_name()
            );
            if self.options.tool == BenchTool::SpdkPerf && !self.options.save_raw_output {
                let stdout = String::from_utf8_lossy(&output.stdout);
                persist(&self.raw_output_path(job), &stdout)?;
            }
        }

        let record = ResultRecord::new(test_id, job, self.options.tool, metrics, cpu);
        if self.options.tool == BenchTool::SpdkPerf {
            write_record_json(&artifact, &record).map_err(|source| ExecError::Persist {
                path: artifact.clone(),
                source,
            })?;
        }

        log!(
            "[{}] IOPS={} BW={} MiB/s LAT={} CPU avg={:.2}% total={:.2}% ({} samples)",
            record.jobname,
            fmt_metric(record.iops),
            fmt_metric(record.bandwidth),
            fmt_metric(record.latency),
            record.cpu_usage_avg,
            record.cpu_usage_total,
            record.cpu_samples
        );

        Ok(record)
    }

    /// 이미 있는 결과 파일에서 결과 행을 다시 만든다
    ///
    /// fio 보고서에는 CPU 값이 없으므로 fio 작업의 CPU 통계는 0으로 채운다.
    pub fn recover_record(&self, test_id: usize, job: &JobSpec) -> Result<ResultRecord, ExecError> {
        let artifact = self.artifact_path(job);
        match self.options.tool {
            BenchTool::Fio => {
                let text =
                    fs::read_to_string(&artifact).map_err(|source| ExecError::ReadArtifact {
                        path: artifact.clone(),
                        source,
                    })?;
                let metrics = parse_fio_json(&text).map_err(|source| ExecError::ParseArtifact {
                    path: artifact.clone(),
                    source,
                })?;
                Ok(ResultRecord::new(
                    test_id,
                    job,
                    BenchTool::Fio,
                    metrics,
                    CpuSummary::default(),
                ))
            }
            BenchTool::SpdkPerf => {
                let mut record =
                    read_record_json(&artifact).map_err(|source| ExecError::ReadArtifact {
                        path: artifact.clone(),
                        source,
                    })?;
                record.test_id = test_id;
                Ok(record)
            }
        }
    }

    fn read_fio_report(&self, artifact: &Path) -> Result<ParsedMetrics, ExecError> {
        let text = fs::read_to_string(artifact).map_err(|source| ExecError::ReadArtifact {
            path: artifact.to_path_buf(),
            source,
        })?;

        parse_fio_json(&text).map_err(|source| {
            // 깨진 보고서는 다음 실행에서 다시 측정하도록 옆으로 옮겨 둔다
            let invalid = artifact.with_extension("json.invalid");
            if let Err(e) = fs::rename(artifact, &invalid) {
                log_error!("Cannot move aside {}: {}", artifact.display(), e);
            }
            ExecError::ParseArtifact {
                path: artifact.to_path_buf(),
                source,
            }
        })
    }
}

// 지울 파일이 없으면 그대로 둔다
fn remove_stale_artifact(artifact: &Path) -> bool {
    match fs::remove_file(artifact) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            log_error!("Cannot remove stale result {}: {}", artifact.display(), e);
            false
        }
    }
}

fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

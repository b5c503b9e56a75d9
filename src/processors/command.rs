//! 외부 벤치마크 도구 명령줄 구성
//!
//! fio / SPDK perf / rpc.py의 인자 형식은 외부 계약이므로 여기서만 만든다.

use crate::models::{IoEngine, JobSpec};
use crate::utils::block_size_to_bytes;
use crate::utils::constants::{PREFILL_BLOCK_SIZE, PREFILL_QUEUE_DEPTH};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 실행 파일 + 인자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `["sudo", "fio"]` 같은 접두 명령에서 시작
    pub fn from_prefix(prefix: &[String], fallback: &str) -> Self {
        match prefix.split_first() {
            Some((program, rest)) => Self {
                program: program.clone(),
                args: rest.to_vec(),
            },
            None => Self::new(fallback),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// 측정용 fio 명령. JSON 보고서는 `output`에 기록된다.
pub fn fio_job_command(
    fio: &[String],
    job: &JobSpec,
    target: &str,
    runtime_seconds: u64,
    use_direct: bool,
    output: &Path,
) -> CommandLine {
    let workload = job.workload();
    let mut cmd = CommandLine::from_prefix(fio, "fio")
        .arg(format!("--name={}", job.job_name()))
        .arg(format!("--filename={target}"))
        .arg(format!("--rw={}", workload.rw))
        .arg(format!("--bs={}", job.block_size()))
        .arg(format!("--iodepth={}", job.queue_depth()))
        .arg(format!("--numjobs={}", job.numjobs()))
        .arg("--time_based")
        .arg(format!("--runtime={runtime_seconds}"))
        .arg(format!("--direct={}", u8::from(use_direct)))
        .arg(format!("--ioengine={}", job.engine().as_fio_name()))
        .arg("--group_reporting")
        .arg("--output-format=json")
        .arg(format!("--output={}", output.display()));

    if let Some(mix) = workload.rwmixread {
        cmd = cmd.arg(format!("--rwmixread={mix}"));
    }

    match job.engine() {
        IoEngine::IoUring => {
            if job.poll().uses_hipri() {
                cmd = cmd.arg("--hipri");
            }
            if job.poll().uses_sqpoll() {
                cmd = cmd.arg("--sqthread_poll=1").arg("--registerfiles=1");
            }
        }
        IoEngine::Libcufile => {
            cmd = cmd.arg("--cuda_io=cufile");
            if let Some(gpu) = job.gpu_id() {
                cmd = cmd.arg(format!("--gpu_dev_ids={gpu}"));
            }
        }
        IoEngine::Libaio | IoEngine::Spdk => {}
    }

    cmd
}

pub fn spdk_perf_path(spdk_dir: &Path) -> PathBuf {
    spdk_dir.join("build").join("examples").join("perf")
}

pub fn spdk_rpc_path(spdk_dir: &Path) -> PathBuf {
    spdk_dir.join("scripts").join("rpc.py")
}

fn pcie_transport(traddr: &str) -> String {
    format!("trtype:PCIe traddr:{traddr}")
}

/// 측정용 SPDK perf 명령. 결과는 stdout으로 나온다.
pub fn spdk_perf_command(
    spdk_dir: &Path,
    job: &JobSpec,
    traddr: &str,
    runtime_seconds: u64,
) -> CommandLine {
    let workload = job.workload();
    let mut cmd = CommandLine::new(spdk_perf_path(spdk_dir).display().to_string())
        .arg("-q")
        .arg(job.queue_depth().to_string())
        .arg("-s")
        .arg(job.block_size_bytes().to_string())
        .arg("-w")
        .arg(workload.rw.clone())
        .arg("-t")
        .arg(runtime_seconds.to_string())
        .arg("-r")
        .arg(pcie_transport(traddr));

    if let Some(mix) = workload.rwmixread {
        cmd = cmd.arg("--rwmixread").arg(mix.to_string());
    }

    cmd
}

/// 대상 전체를 한 번 순차 쓰기하는 fio 명령
pub fn fio_prefill_command(
    fio: &[String],
    target: &str,
    size_bytes: u64,
    use_direct: bool,
) -> CommandLine {
    CommandLine::from_prefix(fio, "fio")
        .arg("--name=prefill")
        .arg(format!("--filename={target}"))
        .arg("--rw=write")
        .arg(format!("--bs={PREFILL_BLOCK_SIZE}"))
        .arg(format!("--iodepth={PREFILL_QUEUE_DEPTH}"))
        .arg("--numjobs=1")
        .arg(format!("--size={size_bytes}"))
        .arg(format!("--direct={}", u8::from(use_direct)))
        .arg("--ioengine=libaio")
        .arg("--group_reporting")
}

pub fn spdk_prefill_command(spdk_dir: &Path, traddr: &str, runtime_seconds: u64) -> CommandLine {
    let bs_bytes = block_size_to_bytes(PREFILL_BLOCK_SIZE).unwrap_or(128 * 1024);
    CommandLine::new(spdk_perf_path(spdk_dir).display().to_string())
        .arg("-q")
        .arg(PREFILL_QUEUE_DEPTH.to_string())
        .arg("-s")
        .arg(bs_bytes.to_string())
        .arg("-w")
        .arg("write")
        .arg("-t")
        .arg(runtime_seconds.to_string())
        .arg("-r")
        .arg(pcie_transport(traddr))
}

pub fn spdk_rpc_command(spdk_dir: &Path, args: &[&str]) -> CommandLine {
    args.iter().fold(
        CommandLine::new(spdk_rpc_path(spdk_dir).display().to_string()),
        |cmd, arg| cmd.arg(*arg),
    )
}

pub fn blockdev_size_command(device: &str) -> CommandLine {
    CommandLine::new("blockdev").arg("--getsize64").arg(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PollMode, WorkloadDescriptor};

    fn job(engine: IoEngine, poll: PollMode, gpu: Option<u32>) -> JobSpec {
        JobSpec::new(
            "/dev/nvme0n1",
            "raw",
            WorkloadDescriptor::new("randrw_30", "randrw", Some(30), true),
            "4k",
            engine,
            poll,
            16,
            2,
            gpu,
        )
        .unwrap()
    }

    #[test]
    fn test_fio_full_poll_flags() {
        let cmd = fio_job_command(
            &["fio".to_string()],
            &job(IoEngine::IoUring, PollMode::Full, None),
            "/dev/nvme0n1",
            60,
            true,
            Path::new("results/json/x.json"),
        );
        assert_eq!(cmd.program, "fio");
        for flag in [
            "--rw=randrw",
            "--bs=4k",
            "--iodepth=16",
            "--numjobs=2",
            "--runtime=60",
            "--direct=1",
            "--ioengine=io_uring",
            "--output-format=json",
            "--output=results/json/x.json",
            "--rwmixread=30",
            "--hipri",
            "--sqthread_poll=1",
            "--registerfiles=1",
        ] {
            assert!(cmd.args.iter().any(|a| a == flag), "missing {flag}");
        }
    }

    #[test]
    fn test_fio_no_poll_flags_for_libaio() {
        let cmd = fio_job_command(
            &[],
            &job(IoEngine::Libaio, PollMode::None, None),
            "/dev/nvme0n1",
            60,
            false,
            Path::new("out.json"),
        );
        assert_eq!(cmd.program, "fio");
        assert!(cmd.args.contains(&"--direct=0".to_string()));
        assert!(!cmd.args.iter().any(|a| a.starts_with("--hipri") || a.starts_with("--sqthread")));
    }

    #[test]
    fn test_fio_prefix_and_cufile() {
        let prefix = vec!["sudo".to_string(), "fio".to_string()];
        let cmd = fio_job_command(
            &prefix,
            &job(IoEngine::Libcufile, PollMode::None, Some(1)),
            "/mnt/fio/nvme0n1_xfs/testfile.dat",
            10,
            true,
            Path::new("o.json"),
        );
        assert_eq!(cmd.program, "sudo");
        assert_eq!(cmd.args[0], "fio");
        assert!(cmd.args.contains(&"--cuda_io=cufile".to_string()));
        assert!(cmd.args.contains(&"--gpu_dev_ids=1".to_string()));
    }

    #[test]
    fn test_spdk_perf_command() {
        let cmd = spdk_perf_command(
            Path::new("/opt/spdk"),
            &job(IoEngine::Spdk, PollMode::None, None),
            "0000:c3:00.0",
            30,
        );
        assert_eq!(cmd.program, "/opt/spdk/build/examples/perf");
        assert_eq!(
            cmd.args,
            vec![
                "-q", "16", "-s", "4096", "-w", "randrw", "-t", "30", "-r",
                "trtype:PCIe traddr:0000:c3:00.0", "--rwmixread", "30",
            ]
        );
        assert!(cmd.to_string().contains("\"trtype:PCIe traddr:0000:c3:00.0\""));
    }

    #[test]
    fn test_prefill_commands() {
        let cmd = fio_prefill_command(&["fio".to_string()], "/dev/nvme1n1", 1 << 30, true);
        assert!(cmd.args.contains(&"--size=1073741824".to_string()));
        assert!(cmd.args.contains(&"--bs=128k".to_string()));
        assert!(!cmd.args.contains(&"--time_based".to_string()));

        let cmd = spdk_prefill_command(Path::new("/opt/spdk"), "0000:c4:00.0", 120);
        assert_eq!(&cmd.args[..6], &["-q", "32", "-s", "131072", "-w", "write"]);

        let cmd = spdk_rpc_command(Path::new("/opt/spdk"), &["bdev_get_bdevs"]);
        assert_eq!(cmd.program, "/opt/spdk/scripts/rpc.py");
        assert_eq!(cmd.args, vec!["bdev_get_bdevs"]);
    }
}

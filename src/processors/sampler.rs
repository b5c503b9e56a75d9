//! 벤치마크 프로세스 트리의 CPU 사용률 샘플러
//!
//! 측정 스레드는 샘플 채널의 송신단을 혼자 소유하고, 정지 신호는 별도 채널로
//! 받는다. 호출 측은 `SamplerHandle::stop`으로 정지 → join → 수집 순서를 지킨다.

use crate::log_error;
use crate::models::{CpuSummary, ResourceSample};
use crate::parsers::round_to;
use crate::utils::constants::CPU_PRECISION;
use crate::utils::SamplerConfig;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use sysinfo::{CpuExt, Pid, PidExt, ProcessExt, System, SystemExt};

/// 프로세스 트리 CPU 측정 방법
///
/// 모든 측정은 직전 호출 이후의 차분 값이다.
pub trait ProcessTreeProbe: Send {
    /// 첫 샘플 전의 기준점 호출 (결과는 버림)
    fn prime(&mut self, root: u32);

    /// root와 살아 있는 모든 자손의 CPU% 합. root가 없으면 `None`.
    fn measure(&mut self, root: u32) -> Option<f64>;

    /// 코어별 사용률 (마지막 `measure` 시점 기준)
    fn per_core(&mut self) -> Option<Vec<f32>>;
}

/// sysinfo 기반 측정
pub struct SysinfoProbe {
    system: System,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    fn refresh(&mut self) {
        self.system.refresh_cpu();
        self.system.refresh_processes();
    }

    // root 자신을 포함한 자손 pid 목록 (부모 관계로 BFS)
    fn process_tree(&self, root: Pid) -> Vec<Pid> {
        let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
        for (pid, process) in self.system.processes() {
            if let Some(parent) = process.parent() {
                children.entry(parent).or_default().push(*pid);
            }
        }

        let mut tree = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(pid) = queue.pop_front() {
            tree.push(pid);
            if let Some(kids) = children.get(&pid) {
                queue.extend(kids.iter().copied());
            }
        }
        tree
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTreeProbe for SysinfoProbe {
    fn prime(&mut self, _root: u32) {
        self.refresh();
    }

    fn measure(&mut self, root: u32) -> Option<f64> {
        self.refresh();
        let root = Pid::from_u32(root);
        self.system.process(root)?;

        // 열거와 측정 사이에 종료된 프로세스는 건너뛴다
        let total = self
            .process_tree(root)
            .into_iter()
            .filter_map(|pid| self.system.process(pid))
            .map(|process| process.cpu_usage() as f64)
            .sum();
        Some(total)
    }

    fn per_core(&mut self) -> Option<Vec<f32>> {
        let cores: Vec<f32> = self.system.cpus().iter().map(|cpu| cpu.cpu_usage()).collect();
        if cores.is_empty() {
            None
        } else {
            Some(cores)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerOptions {
    pub interval: Duration,
    pub warmup: Duration,
    pub per_core: bool,
}

impl From<&SamplerConfig> for SamplerOptions {
    fn from(config: &SamplerConfig) -> Self {
        Self {
            interval: config.interval(),
            warmup: config.warmup(),
            per_core: config.per_core,
        }
    }
}

pub struct ResourceSampler;

impl ResourceSampler {
    /// 전용 스레드에서 샘플링 시작
    pub fn spawn<P>(pid: u32, options: SamplerOptions, mut probe: P) -> io::Result<SamplerHandle>
    where
        P: ProcessTreeProbe + 'static,
    {
        let (sample_tx, sample_rx) = unbounded::<ResourceSample>();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread = thread::Builder::new()
            .name(format!("cpu-sampler-{pid}"))
            .spawn(move || {
                probe.prime(pid);
                if !wait_for_next_tick(&stop_rx, options.warmup) {
                    return;
                }

                loop {
                    if let Some(total_cpu) = probe.measure(pid) {
                        let per_core = if options.per_core {
                            probe.per_core()
                        } else {
                            None
                        };
                        let sample = ResourceSample {
                            timestamp: unix_timestamp(),
                            total_cpu,
                            per_core,
                        };
                        if sample_tx.send(sample).is_err() {
                            break;
                        }
                    }

                    if !wait_for_next_tick(&stop_rx, options.interval) {
                        break;
                    }
                }
            })?;

        Ok(SamplerHandle {
            stop_tx,
            samples: sample_rx,
            thread,
        })
    }
}

// 정지 신호가 오거나 송신단이 사라지면 false
fn wait_for_next_tick(stop_rx: &Receiver<()>, timeout: Duration) -> bool {
    matches!(stop_rx.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
}

fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// 실행 중인 샘플러
///
/// 핸들을 stop 없이 버리면 정지 채널이 끊기면서 스레드도 종료된다.
pub struct SamplerHandle {
    stop_tx: Sender<()>,
    samples: Receiver<ResourceSample>,
    thread: JoinHandle<()>,
}

impl SamplerHandle {
    /// 정지 신호 → 스레드 join → 샘플 수집
    pub fn stop(self) -> Vec<ResourceSample> {
        let _ = self.stop_tx.send(());
        if self.thread.join().is_err() {
            log_error!("CPU sampler thread panicked, keeping samples collected so far");
        }
        self.samples.try_iter().collect()
    }
}

/// 앞뒤 `floor(n * trim_ratio)`개를 버린 평균과 합
///
/// 남는 샘플이 없으면 전체를 사용한다.
pub fn trim_and_average(values: &[f64], trim_ratio: f64) -> CpuSummary {
    let n = values.len();
    if n == 0 {
        return CpuSummary::default();
    }

    let cut = (n as f64 * trim_ratio).floor() as usize;
    let trimmed = if n > cut * 2 {
        &values[cut..n - cut]
    } else {
        values
    };

    let total: f64 = trimmed.iter().sum();
    let avg = total / trimmed.len() as f64;

    CpuSummary {
        avg: round_to(avg, CPU_PRECISION),
        total: round_to(total, CPU_PRECISION),
        samples: n,
    }
}

pub fn summarize_samples(samples: &[ResourceSample], trim_ratio: f64) -> CpuSummary {
    let values: Vec<f64> = samples.iter().map(|s| s.total_cpu).collect();
    trim_and_average(&values, trim_ratio)
}

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use iodse::parsers::{parse_fio_json, parse_perf_output, perf_text::parse_perf_line};
use iodse::processors::trim_and_average;

// 샘플 SPDK perf 라인
const PERF_LINE: &str = "IOPS = 512.3k, BW = 2001.17 MiB/s, clat min/avg/max = 12.1/61.77/910.4 usec";

const FIO_REPORT: &str = r#"{
  "fio version": "fio-3.36",
  "jobs": [
    {
      "jobname": "randrw_50_4k",
      "read": { "iops": 41234.5, "bw": 164938, "lat_ns": { "mean": 98765.4 } },
      "write": { "iops": 41201.2, "bw": 164804, "lat_ns": { "mean": 123456.7 } }
    }
  ]
}"#;

fn perf_output(lines: usize) -> String {
    let mut out = String::new();
    for i in 0..lines {
        out.push_str(&format!(
            "Device 0000:5e:00.0 from core {}: IOPS = {}.5k BW = {} MiB/s\n",
            i % 8,
            100 + i,
            400 + i
        ));
    }
    out.push_str("clat min/avg/max = 10.0/55.25/800.0\n");
    out
}

fn bench_perf_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("perf_text");

    group.bench_function("single_line", |b| {
        b.iter(|| parse_perf_line(black_box(PERF_LINE)))
    });

    group.bench_function("no_match", |b| {
        b.iter(|| parse_perf_line(black_box("Initializing NVMe Controllers")))
    });

    let output = perf_output(1000);
    group.bench_function("output_1000_lines", |b| {
        b.iter(|| parse_perf_output(black_box(&output)))
    });

    group.finish();
}

fn bench_fio_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("fio_json");

    group.bench_function("report", |b| {
        b.iter(|| parse_fio_json(black_box(FIO_REPORT)))
    });

    let noisy = format!("note: both iodepth >= 1 and synchronous I/O engine selected\n{FIO_REPORT}");
    group.bench_function("report_with_preamble", |b| {
        b.iter(|| parse_fio_json(black_box(&noisy)))
    });

    group.finish();
}

fn bench_trim(c: &mut Criterion) {
    // 300초 실행, 1초 간격 샘플
    let samples: Vec<f64> = (0..300).map(|i| ((i * 37) % 100) as f64 * 1.5).collect();

    let mut group = c.benchmark_group("cpu_trim");

    group.bench_function("ratio_0_1", |b| {
        b.iter(|| trim_and_average(black_box(&samples), 0.1))
    });

    group.bench_function("no_trim", |b| {
        b.iter(|| trim_and_average(black_box(&samples), 0.0))
    });

    group.finish();
}

criterion_group!(benches, bench_perf_text, bench_fio_json, bench_trim);
criterion_main!(benches);

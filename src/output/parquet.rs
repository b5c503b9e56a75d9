use crate::log;
use crate::models::ResultRecord;
use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

// 결과 행 하나의 대략적인 크기 (바이트)
const ESTIMATED_ROW_SIZE: usize = 300;

// 데이터 크기에 따라 압축 방식 선택
fn select_compression(data_size: usize) -> Result<Compression, Box<dyn std::error::Error>> {
    Ok(match data_size {
        n if n < 1024 * 1024 => Compression::SNAPPY,
        n if n < 10 * 1024 * 1024 => Compression::ZSTD(ZstdLevel::try_new(3)?),
        _ => Compression::ZSTD(ZstdLevel::try_new(6)?),
    })
}

fn create_writer_properties(compression: Compression) -> WriterProperties {
    WriterProperties::builder()
        .set_compression(compression)
        .set_encoding(Encoding::PLAIN)
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Chunk)
        .build()
}

pub fn result_schema() -> Schema {
    Schema::new(vec![
        Field::new("test_id", DataType::UInt64, false),
        Field::new("jobname", DataType::Utf8, false),
        Field::new("tool", DataType::Utf8, false),
        Field::new("device", DataType::Utf8, false),
        Field::new("filesystem", DataType::Utf8, false),
        Field::new("workload", DataType::Utf8, false),
        Field::new("rw", DataType::Utf8, false),
        Field::new("rwmixread", DataType::UInt32, true),
        Field::new("block_size", DataType::Utf8, false),
        Field::new("engine", DataType::Utf8, false),
        Field::new("poll", DataType::Utf8, false),
        Field::new("iodepth", DataType::UInt32, false),
        Field::new("numjobs", DataType::UInt32, false),
        Field::new("gpu_id", DataType::UInt32, true),
        Field::new("iops", DataType::Float64, true),
        Field::new("latency", DataType::Float64, true),
        Field::new("bandwidth_mib_s", DataType::Float64, true),
        Field::new("read_latency", DataType::Float64, true),
        Field::new("write_latency", DataType::Float64, true),
        Field::new("cpu_usage_avg", DataType::Float64, false),
        Field::new("cpu_usage_total", DataType::Float64, false),
        Field::new("cpu_samples", DataType::UInt64, false),
    ])
}

fn records_to_batch(
    records: &[ResultRecord],
    schema: Arc<Schema>,
) -> Result<RecordBatch, arrow::error::ArrowError> {
    let strings = |f: fn(&ResultRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(
            records.iter().map(f).collect::<Vec<&str>>(),
        ))
    };
    let floats = |f: fn(&ResultRecord) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(
            records.iter().map(f).collect::<Vec<Option<f64>>>(),
        ))
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(
            records.iter().map(|r| r.test_id as u64).collect::<Vec<_>>(),
        )),
        strings(|r| r.jobname.as_str()),
        strings(|r| r.tool.display_name()),
        strings(|r| r.device.as_str()),
        strings(|r| r.filesystem.as_str()),
        strings(|r| r.workload.as_str()),
        strings(|r| r.rw.as_str()),
        Arc::new(UInt32Array::from(
            records
                .iter()
                .map(|r| r.rwmixread.map(u32::from))
                .collect::<Vec<_>>(),
        )),
        strings(|r| r.block_size.as_str()),
        strings(|r| r.engine.as_str()),
        strings(|r| r.poll.as_str()),
        Arc::new(UInt32Array::from(
            records.iter().map(|r| r.iodepth).collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            records.iter().map(|r| r.numjobs).collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            records.iter().map(|r| r.gpu_id).collect::<Vec<_>>(),
        )),
        floats(|r| r.iops),
        floats(|r| r.latency),
        floats(|r| r.bandwidth),
        floats(|r| r.read_latency),
        floats(|r| r.write_latency),
        floats(|r| Some(r.cpu_usage_avg)),
        floats(|r| Some(r.cpu_usage_total)),
        Arc::new(UInt64Array::from(
            records.iter().map(|r| r.cpu_samples as u64).collect::<Vec<_>>(),
        )),
    ];

    RecordBatch::try_new(schema, columns)
}

/// 캠페인 결과 전체를 하나의 Parquet 파일로 저장
pub fn save_results_to_parquet(
    records: &[ResultRecord],
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if records.is_empty() {
        log!("No results to export, skipping {}", output_path.display());
        return Ok(());
    }

    let start_time = Instant::now();
    let compression = select_compression(records.len() * ESTIMATED_ROW_SIZE)?;
    let compression_name = match compression {
        Compression::SNAPPY => "SNAPPY",
        Compression::ZSTD(_) => "ZSTD",
        _ => "Other",
    };

    log!(
        "Saving {} results to {} using {} compression",
        records.len(),
        output_path.display(),
        compression_name
    );

    let schema = Arc::new(result_schema());
    let batch = records_to_batch(records, schema.clone())?;

    let file = File::create(output_path)?;
    let props = create_writer_properties(compression);
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    log!(
        "Parquet file saved in {:.2}s: {}",
        start_time.elapsed().as_secs_f64(),
        output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BenchTool, CpuSummary, IoEngine, JobSpec, ParsedMetrics, PollMode, WorkloadDescriptor,
    };
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::Float64Type;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    fn record(test_id: usize, iops: Option<f64>, gpu: Option<u32>) -> ResultRecord {
        let job = JobSpec::new(
            "/dev/nvme0n1",
            "xfs",
            WorkloadDescriptor::new("randread", "randread", None, true),
            "1m",
            IoEngine::Libcufile,
            PollMode::None,
            4,
            1,
            gpu,
        )
        .unwrap();
        let metrics = ParsedMetrics {
            iops,
            ..Default::default()
        };
        ResultRecord::new(test_id, &job, BenchTool::Fio, metrics, CpuSummary::default())
    }

    #[test]
    fn test_parquet_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dse_results.parquet");
        let records = vec![record(1, Some(3000.0), Some(0)), record(2, None, None)];
        save_results_to_parquet(&records, &path).unwrap();

        let file = File::open(&path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 2);

        let iops = batches[0]
            .column_by_name("iops")
            .unwrap()
            .as_primitive::<Float64Type>();
        assert_eq!(iops.value(0), 3000.0);
        assert!(iops.is_null(1));
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        save_results_to_parquet(&[], &path).unwrap();
        assert!(!path.exists());
    }
}

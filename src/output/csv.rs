use crate::models::{ResourceSample, ResultRecord, RESULT_COLUMNS};
use crate::utils::constants::PARTIAL_CSV_NAME;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// 결과 행을 하나씩 덧붙이는 CSV 저장소
///
/// 헤더는 파일이 비어 있을 때 한 번만 쓴다. 기존 행은 다시 쓰지 않는다.
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(results_dir: &Path) -> Self {
        Self {
            path: results_dir.join(PARTIAL_CSV_NAME),
        }
    }

    pub fn at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &ResultRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(RESULT_COLUMNS)?;
        }
        writer.write_record(record.to_csv_row())?;
        writer.flush()?;
        Ok(())
    }

    /// 저장된 모든 행. 파일이 없으면 빈 목록.
    pub fn read_records(&self) -> io::Result<Vec<ResultRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new().has_headers(true).from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: ResultRecord = row?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn row_count(&self) -> io::Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(&self.path)?;
        Ok(reader.records().count())
    }
}

/// 샘플 전체를 `<dir>/<stem>_cpu_timeline.csv`로 저장
pub fn save_cpu_timeline(
    samples: &[ResourceSample],
    output_dir: &Path,
    stem: &str,
) -> io::Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{stem}_cpu_timeline.csv"));
    let file = File::create(&path)?;
    let mut writer = WriterBuilder::new().from_writer(file);

    let core_count = samples
        .first()
        .and_then(|s| s.per_core.as_ref())
        .map_or(0, |cores| cores.len());

    let mut header = vec!["timestamp".to_string(), "total_cpu".to_string()];
    header.extend((0..core_count).map(|i| format!("core_{i}")));
    writer.write_record(&header)?;

    for sample in samples {
        let mut row = vec![sample.timestamp.to_string(), sample.total_cpu.to_string()];
        if let Some(cores) = &sample.per_core {
            row.extend(cores.iter().take(core_count).map(|c| c.to_string()));
        }
        // 코어 수가 달라진 샘플은 빈 칸으로 맞춘다
        row.resize(header.len(), String::new());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(path)
}

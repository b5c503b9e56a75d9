use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::Once;
use std::sync::OnceLock;

// 전역 로거 인스턴스를 저장할 정적 변수
static LOGGER: OnceLock<Mutex<Option<File>>> = OnceLock::new();
static INIT: Once = Once::new();

pub const LOG_FILE_NAME: &str = "log.txt";

pub struct Logger;

impl Logger {
    /// 결과 디렉토리 아래 log.txt에 콘솔 출력을 함께 기록하도록 설정
    ///
    /// 재개(resume) 실행에서도 이전 기록이 남도록 append 모드로 연다.
    pub fn init(results_dir: &Path) {
        INIT.call_once(|| {
            if !results_dir.exists() {
                if let Err(e) = fs::create_dir_all(results_dir) {
                    eprintln!("Cannot create log directory {}: {e}", results_dir.display());
                    LOGGER.get_or_init(|| Mutex::new(None));
                    return;
                }
            }

            let log_path = results_dir.join(LOG_FILE_NAME);
            let file = OpenOptions::new().create(true).append(true).open(&log_path);

            match file {
                Ok(file) => {
                    println!("Logging to '{}'", log_path.display());
                    LOGGER.get_or_init(|| Mutex::new(Some(file)));
                }
                Err(e) => {
                    eprintln!("Cannot open log file: {e}");
                    LOGGER.get_or_init(|| Mutex::new(None));
                }
            }
        });
    }

    pub fn log(message: &str) {
        println!("{message}");
        Self::write_line(message);
    }

    pub fn log_error(message: &str) {
        eprintln!("{message}");
        Self::write_line(&format!("ERROR: {message}"));
    }

    // 초기화 전이면 콘솔에만 출력된다
    fn write_line(line: &str) {
        if let Some(logger) = LOGGER.get() {
            if let Ok(mut file_guard) = logger.lock() {
                if let Some(file) = file_guard.as_mut() {
                    if let Err(e) = writeln!(file, "{line}") {
                        eprintln!("Failed to write log file: {e}");
                    }
                }
            }
        }
    }

    pub fn flush() -> std::io::Result<()> {
        if let Some(logger) = LOGGER.get() {
            if let Ok(mut file_guard) = logger.lock() {
                if let Some(file) = file_guard.as_mut() {
                    file.flush()?;
                }
            }
        }
        Ok(())
    }
}

// 매크로 정의
#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::utils::Logger::log(&message);
    }};
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::utils::Logger::log_error(&message);
    }};
}

use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use crate::errors::Result;

/// 日志行时间戳格式，例如 2024-03-01 00:00:00,123
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Writes every log line to both the log file and stdout.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        io::stdout().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        io::stdout().flush()
    }
}

pub fn format_line(timestamp: &str, component: &str, level: log::Level, message: &str) -> String {
    format!("{} - {} - {} - {}", timestamp, component, level, message)
}

/// Initialize the process-wide logger.
///
/// Lines go to `log_file` (appended, created if missing) and stdout. The default level is
/// `info`; `RUST_LOG` overrides it. Calling this twice returns an error.
pub fn init_logger(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
            writeln!(
                buf,
                "{}",
                format_line(&timestamp, record.target(), record.level(), &record.args().to_string())
            )
        })
        .target(Target::Pipe(Box::new(TeeWriter { file })))
        .try_init()?;

    Ok(())
}

//! Logging setup.
//!
//! Every line is `[YYYY-MM-DD HH:MM:SS] [LEVEL] <message>`, written to stderr
//! and, when a logfile is configured, appended to that file as well.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use env_logger::{Builder, Target};
use eyre::{Context, Result};
use log::LevelFilter;

/// Writer that always hits stderr and optionally tees into a file.
struct TeeWriter {
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            // File trouble must not take down the stderr channel.
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            let _ = file.flush();
        }
        Ok(())
    }
}

/// Install the process-wide logger. Defaults to INFO; `RUST_LOG` overrides.
pub fn init(logfile: Option<&Path>) -> Result<()> {
    let file = match logfile {
        Some(path) if !path.as_os_str().is_empty() => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .context(format!("Failed to open log file {}", path.display()))?,
        ),
        _ => None,
    };

    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(TeeWriter { file })))
        .try_init()
        .ok();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_tee_writer_appends_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let file = OpenOptions::new().create(true).append(true).open(&path).unwrap();

        let mut tee = TeeWriter { file: Some(file) };
        tee.write_all(b"[2024-01-01 00:00:00] [INFO] hello\n").unwrap();
        tee.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[2024-01-01 00:00:00] [INFO] hello\n");
    }

    #[test]
    fn test_tee_writer_without_file() {
        let mut tee = TeeWriter { file: None };
        assert!(tee.write_all(b"stderr only\n").is_ok());
    }

    #[test]
    fn test_init_bad_logfile_path() {
        let result = init(Some(Path::new("/nonexistent-dir/toolbelt.log")));
        assert!(result.is_err());
    }

    #[test]
    fn test_init_without_logfile() {
        assert!(init(None).is_ok());
    }
}

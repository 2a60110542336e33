//! Logging setup
//!
//! Console output plus a size-rotated log file. When the file reaches
//! `MAX_LOG_BYTES` it is shifted to `.1` (older backups move up one, the
//! oldest is dropped) and a fresh file is started.

use eyre::{Result, WrapErr};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 10 MiB
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_BACKUPS: usize = 5;

pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFileWriter {
    pub fn new(path: impl AsRef<Path>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = Self::open(&path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            path,
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn open(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;

        self.file = Self::open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Install the global subscriber: console + rotating file.
/// `RUST_LOG` overrides the default `uniquotes=info` directive.
pub fn init(log_path: impl AsRef<Path>) -> Result<()> {
    let writer = RotatingFileWriter::new(log_path.as_ref(), MAX_LOG_BYTES, LOG_BACKUPS)
        .wrap_err_with(|| format!("Failed to open log file {}", log_path.as_ref().display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(writer)),
        )
        .with(EnvFilter::from_default_env().add_directive("uniquotes=info".parse()?))
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotates_and_caps_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("test.log");
        let mut writer = RotatingFileWriter::new(&path, 100, 2).unwrap();

        let line = [b'x'; 60];
        for _ in 0..5 {
            writer.write_all(&line).unwrap();
        }
        writer.flush().unwrap();

        // Each 60-byte write overflows the 100-byte cap, so every write starts a new file
        assert_eq!(fs::metadata(&path).unwrap().len(), 60);
        assert!(writer.backup_path(1).exists());
        assert!(writer.backup_path(2).exists());
        assert!(!writer.backup_path(3).exists());
    }

    #[test]
    fn test_appends_until_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let mut writer = RotatingFileWriter::new(&path, 1024, 5).unwrap();

        writer.write_all(b"first\n").unwrap();
        writer.write_all(b"second\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert!(!writer.backup_path(1).exists());
    }

    #[test]
    fn test_resumes_size_of_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        fs::write(&path, [b'y'; 90]).unwrap();

        let mut writer = RotatingFileWriter::new(&path, 100, 1).unwrap();
        writer.write_all(&[b'z'; 20]).unwrap();

        assert_eq!(fs::metadata(writer.backup_path(1)).unwrap().len(), 90);
        assert_eq!(fs::metadata(&path).unwrap().len(), 20);
    }
}

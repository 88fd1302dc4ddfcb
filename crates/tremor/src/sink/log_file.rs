//! Text file event log
//!
//! ```text
//! Vibration Log File
//! 20230515_160000 - Vibration detected: 10.392304845413264
//! ```
//!
//! The header is written only when the file is created. The directory and
//! the file are recreated on the next append if they disappear.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::EventLogSink;
use crate::error::LogWriteError;
use crate::event::Event;

pub const LOG_HEADER: &str = "Vibration Log File\n";

/// Create the parent directory and the log file with its header, unless the
/// file already exists. Never truncates.
pub fn ensure_log_file(path: &Path) -> Result<(), LogWriteError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            fs::create_dir_all(parent).map_err(|source| LogWriteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
            info!("Created directory: {:?}", parent);
        }
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(LOG_HEADER.as_bytes())
                .map_err(|source| LogWriteError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            info!("Created log file: {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(LogWriteError::Open {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Event log backed by a text file.
pub struct EventLogFile {
    path: PathBuf,
}

impl EventLogFile {
    /// No I/O happens until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&self, line: &str) -> Result<(), LogWriteError> {
        ensure_log_file(&self.path)?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| LogWriteError::Open {
                path: self.path.clone(),
                source,
            })?;

        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| LogWriteError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait::async_trait]
impl EventLogSink for EventLogFile {
    async fn append(&mut self, event: &Event) -> Result<(), LogWriteError> {
        self.append_line(&event.log_line())?;
        debug!("Logged vibration: {} at {}", event.magnitude, event.timestamp);
        Ok(())
    }
}

//! Timestamped debug transcript file.

use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

/// Default transcript file-name prefix.
pub const DEFAULT_PREFIX: &str = "pmap_";

/// Default transcript file-name suffix.
pub const DEFAULT_SUFFIX: &str = ".log";

/// `strftime` pattern of the timestamp embedded in transcript names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Where and how transcript files are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptNaming {
    /// Directory the transcript is created in.
    pub dir: PathBuf,
    /// Text before the timestamp.
    pub prefix: String,
    /// Text after the timestamp.
    pub suffix: String,
}

impl Default for TranscriptNaming {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl TranscriptNaming {
    /// Naming rooted at `dir` with the default prefix and suffix.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// File name for a transcript started at `at`.
    pub fn file_name(&self, at: DateTime<Local>) -> String {
        format!("{}{}{}", self.prefix, at.format(TIMESTAMP_FORMAT), self.suffix)
    }

    /// Full path for a transcript started at `at`.
    pub fn path_at(&self, at: DateTime<Local>) -> PathBuf {
        self.dir.join(self.file_name(at))
    }
}

/// Optional transcript that mirrors operator narration.
///
/// Inactive by default. Writes are best-effort: a failed write is logged and
/// otherwise ignored, since the console copy has already been produced.
#[derive(Debug, Default)]
pub struct DebugSink {
    file: Option<LineWriter<File>>,
    path: Option<PathBuf>,
}

impl DebugSink {
    /// An inactive sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript named from the current local time, replacing any
    /// transcript that is already open.
    ///
    /// Returns the path of the new transcript, or `None` if the file could not
    /// be created, in which case the sink is left inactive.
    pub fn init(&mut self, naming: &TranscriptNaming) -> Option<&Path> {
        self.deinit();

        let path = naming.path_at(Local::now());
        match File::create(&path) {
            Ok(file) => {
                tracing::debug!(path = %path.display(), "debug transcript opened");
                self.file = Some(LineWriter::new(file));
                self.path = Some(path);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot create debug transcript");
            }
        }
        self.path.as_deref()
    }

    /// Close the transcript if one is open. Idempotent.
    pub fn deinit(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                tracing::warn!(error = %e, "flushing debug transcript failed");
            }
        }
        self.path = None;
    }

    /// Whether a transcript is currently open.
    pub fn is_active(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the open transcript.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one line. A no-op while inactive.
    pub fn write_line(&mut self, line: &str) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = writeln!(file, "{line}") {
                tracing::warn!(error = %e, "writing debug transcript failed");
            }
        }
    }
}

impl Drop for DebugSink {
    fn drop(&mut self) {
        self.deinit();
    }
}

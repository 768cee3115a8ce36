//! Candidate serial device discovery.
//!
//! Discovery is purely an operator aid: it lists device nodes that look like
//! serial ports so the operator can pick the right path. It never fails; any
//! problem reading the system simply yields an empty list.

use std::path::PathBuf;

/// Device-name prefixes that identify serial nodes on this platform.
#[cfg(target_os = "macos")]
pub const DEVICE_PREFIXES: &[&str] = &["cu."];

/// Device-name prefixes that identify serial nodes on this platform.
#[cfg(not(target_os = "macos"))]
pub const DEVICE_PREFIXES: &[&str] = &["ttyS", "ttyUSB", "ttyACM"];

/// Source of candidate serial device paths.
pub trait DeviceScanner: Send + Sync {
    /// Human-readable description of where the scan looks, used as a heading.
    fn describe(&self) -> String;

    /// List candidate device paths. Never fails.
    fn scan(&self) -> Vec<String>;
}

/// Scans a device directory for entries whose names start with one of a set
/// of prefixes.
#[derive(Debug, Clone)]
pub struct DevDirScanner {
    dir: PathBuf,
    prefixes: Vec<String>,
}

impl DevDirScanner {
    /// Scanner over `dir` using the platform's [`DEVICE_PREFIXES`].
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_prefixes(dir, DEVICE_PREFIXES.iter().copied())
    }

    /// Scanner over `dir` matching the given name prefixes.
    pub fn with_prefixes<I, S>(dir: impl Into<PathBuf>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dir: dir.into(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for DevDirScanner {
    fn default() -> Self {
        Self::new("/dev")
    }
}

impl DeviceScanner for DevDirScanner {
    fn describe(&self) -> String {
        format!("Available serial devices in {}/:", self.dir.display())
    }

    fn scan(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %self.dir.display(), error = %e, "device directory not readable");
                return Vec::new();
            }
        };

        let mut found: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| self.prefixes.iter().any(|p| name.starts_with(p.as_str())))
            .map(|name| self.dir.join(name).display().to_string())
            .collect();
        found.sort();
        found
    }
}

/// Asks the `serialport` crate for the ports it knows about.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemScanner;

impl DeviceScanner for SystemScanner {
    fn describe(&self) -> String {
        "Available serial devices:".to_string()
    }

    fn scan(&self) -> Vec<String> {
        match serialport::available_ports() {
            Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
            Err(e) => {
                tracing::debug!(error = %e, "serial port enumeration failed");
                Vec::new()
            }
        }
    }
}

/// The scanner used when none is supplied: `/dev` on unix, the system
/// enumeration everywhere else.
pub fn default_scanner() -> Box<dyn DeviceScanner> {
    #[cfg(unix)]
    {
        Box::new(DevDirScanner::default())
    }

    #[cfg(not(unix))]
    {
        Box::new(SystemScanner)
    }
}

//! Console narration mirrored into the debug transcript.

use super::sink::{DebugSink, TranscriptNaming};
use parking_lot::Mutex;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Written to the error stream when a report is requested without a message.
pub const MISSING_MESSAGE: &str = "Error: message is missing";

struct ReporterInner {
    console: Box<dyn Write + Send>,
    errors: Box<dyn Write + Send>,
    sink: DebugSink,
    naming: TranscriptNaming,
}

impl ReporterInner {
    fn emit(&mut self, text: &str) {
        let text = text.strip_suffix('\n').unwrap_or(text);
        // Console output is advisory; a closed stdout must not take the link down.
        let _ = writeln!(self.console, "{text}");
        let _ = self.console.flush();
        self.sink.write_line(text);
    }
}

/// Operator-facing reporter with an optional transcript.
///
/// Cloning is cheap and every clone writes to the same console and transcript,
/// so the transport and the code driving it can each hold one.
#[derive(Clone)]
pub struct Reporter {
    inner: Arc<Mutex<ReporterInner>>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    /// Reporter writing to stdout, with usage errors on stderr.
    pub fn new() -> Self {
        Self::with_writers(Box::new(std::io::stdout()), Box::new(std::io::stderr()))
    }

    /// Reporter writing to the given console and error streams.
    pub fn with_writers(console: Box<dyn Write + Send>, errors: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ReporterInner {
                console,
                errors,
                sink: DebugSink::new(),
                naming: TranscriptNaming::default(),
            })),
        }
    }

    /// Change where future transcripts are created.
    pub fn set_transcript_naming(&self, naming: TranscriptNaming) {
        self.inner.lock().naming = naming;
    }

    /// Start a transcript named from the current time, replacing any open one.
    ///
    /// Returns the transcript path, or `None` when it could not be created;
    /// reporting then continues console-only.
    pub fn init_debug_sink(&self) -> Option<PathBuf> {
        let mut inner = self.inner.lock();
        let naming = inner.naming.clone();
        inner.sink.init(&naming).map(|p| p.to_path_buf())
    }

    /// Close the transcript. Idempotent.
    pub fn deinit_debug_sink(&self) {
        self.inner.lock().sink.deinit();
    }

    /// Path of the open transcript, if any.
    pub fn debug_sink_path(&self) -> Option<PathBuf> {
        self.inner.lock().sink.path().map(|p| p.to_path_buf())
    }

    /// Write a line to the console and, when active, to the transcript.
    pub fn report(&self, text: impl AsRef<str>) {
        self.inner.lock().emit(text.as_ref());
    }

    /// Report an operator-facing error. Same destinations as [`report`](Self::report).
    pub fn report_error(&self, text: impl AsRef<str>) {
        let text = text.as_ref();
        tracing::warn!(text, "reported error");
        self.inner.lock().emit(text);
    }

    /// Write a line to the transcript only. A no-op while no transcript is open.
    pub fn debug(&self, text: impl AsRef<str>) {
        let text = text.as_ref();
        self.inner
            .lock()
            .sink
            .write_line(text.strip_suffix('\n').unwrap_or(text));
    }

    /// Report a message that may be absent.
    ///
    /// `None` is a caller mistake: it is noted on the error stream and nothing
    /// is written to the console or transcript.
    pub fn report_maybe(&self, text: Option<&str>) {
        match text {
            Some(text) => self.report(text),
            None => {
                let mut inner = self.inner.lock();
                let _ = writeln!(inner.errors, "{MISSING_MESSAGE}");
                let _ = inner.errors.flush();
            }
        }
    }

    /// Report `text`, then block until the operator enters a newline on `input`.
    ///
    /// This is a suspension point: the calling thread does not return until a
    /// full line (or end of input) has been read. Hosts that cannot block
    /// should call [`report`](Self::report) and collect acknowledgement
    /// themselves.
    pub fn report_and_wait<R: BufRead>(&self, text: impl AsRef<str>, input: &mut R) -> std::io::Result<()> {
        self.report(text);
        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(())
    }

    /// [`report_and_wait`](Self::report_and_wait) on standard input.
    pub fn report_and_wait_stdin(&self, text: impl AsRef<str>) -> std::io::Result<()> {
        let stdin = std::io::stdin();
        let mut lock = stdin.lock();
        self.report_and_wait(text, &mut lock)
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("debug_sink", &self.debug_sink_path())
            .finish()
    }
}

/// In-memory writer whose clones share one buffer.
///
/// Handy as a reporter console when the narration needs to be inspected.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Format and [`report`](Reporter::report) in one step.
///
/// ```
/// use pmap_serial::{report, report::Reporter};
///
/// let reporter = Reporter::new();
/// report!(reporter, "Opening COM port: {}", "/dev/ttyUSB0");
/// ```
#[macro_export]
macro_rules! report {
    ($reporter:expr, $($arg:tt)*) => {
        $reporter.report(::std::format!($($arg)*))
    };
}

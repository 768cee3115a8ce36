//! Operator narration and the optional debug transcript.
//!
//! [`Reporter`] is the one call sites use; it writes every message to the
//! console and mirrors it into a [`DebugSink`] while a transcript is open.

pub mod reporter;
pub mod sink;

pub use reporter::{MemoryWriter, Reporter, MISSING_MESSAGE};
pub use sink::{DebugSink, TranscriptNaming, DEFAULT_PREFIX, DEFAULT_SUFFIX, TIMESTAMP_FORMAT};

//! Log capture for assertions on emitted events.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log lines in memory.
///
/// Install it for the current thread with [`LogCapture::install`]; with the
/// default single-threaded `#[tokio::test]` runtime that covers every task
/// the test drives.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

/// Writer handed to the fmt layer.
pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut buffer) => buffer.extend_from_slice(buf),
            Err(_) => return Err(io::Error::new(io::ErrorKind::Other, "log buffer poisoned")),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(Arc::clone(&self.buffer))
    }
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every event at TRACE and above until the guard is dropped.
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        self.buffer
            .lock()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Lines at `level` (e.g. "WARN", "TRACE") containing `needle`.
    pub fn count(&self, level: &str, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|line| line.trim_start().starts_with(level) && line.contains(needle))
            .count()
    }
}

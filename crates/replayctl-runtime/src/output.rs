//! Replayer stdout/stderr capture.
//!
//! The replayer is a C/C++ preload and can emit non-UTF8 bytes. Lines are
//! read byte-wise and decoded lossily so a stray byte never ends capture.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Maximum number of lines kept per replayer run.
pub const MAX_OUTPUT_LINES: usize = 5000;

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// One captured line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub line: String,
    pub captured_at: DateTime<Utc>,
}

/// Ring buffer of the most recent replayer output.
#[derive(Debug)]
pub struct OutputBuffer {
    lines: Mutex<VecDeque<OutputLine>>,
    capacity: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_OUTPUT_LINES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity.min(MAX_OUTPUT_LINES))),
            capacity: capacity.max(1),
        }
    }

    /// Add a line, dropping the oldest when full.
    pub fn push(&self, stream: OutputStream, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(OutputLine {
            stream,
            line,
            captured_at: Utc::now(),
        });
    }

    /// Take every buffered line, leaving the buffer empty.
    pub fn drain(&self) -> Vec<OutputLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one pipe into `buffer` until EOF.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: OutputStream,
    buffer: Arc<OutputBuffer>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf).into_owned();
                    trace!(stream = kind.as_str(), "{line}");
                    buffer.push(kind, line);
                }
                Err(e) => {
                    debug!(stream = kind.as_str(), error = %e, "Output reader exiting on read error");
                    break;
                }
            }
        }
    })
}

/// Take the child's pipes and start one reader per pipe.
pub fn spawn_output_readers(child: &mut Child, buffer: &Arc<OutputBuffer>) -> Vec<JoinHandle<()>> {
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_stream_reader(
            stdout,
            OutputStream::Stdout,
            Arc::clone(buffer),
        ));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_stream_reader(
            stderr,
            OutputStream::Stderr,
            Arc::clone(buffer),
        ));
    }
    readers
}

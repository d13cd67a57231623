// src/exec/drain.rs

//! Background stream consumption.
//!
//! A child writing to a pipe nobody reads blocks once the OS pipe buffer is
//! full. [`StreamDrain`] reads a stream to EOF on its own thread so that can
//! never happen, handing each line to an optional sink.

use std::io::{self, BufRead, BufReader, Read};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

/// Callback receiving each drained line.
pub type LineSink = Box<dyn FnMut(String) + Send + 'static>;

/// Read `reader` line by line until EOF, calling `on_line` for each line.
///
/// Lines are split on `\n`, decoded lossily as UTF-8, and stripped of their
/// trailing `\n` / `\r\n`. A final line without a newline is still delivered.
pub fn read_lines<R: Read>(reader: R, mut on_line: impl FnMut(String)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let n = match reader.read_until(b'\n', &mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            return Ok(());
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        on_line(String::from_utf8_lossy(&buf).into_owned());
    }
}

/// Handle to a thread draining one stream.
///
/// The thread ends on its own at EOF; dropping the handle detaches it.
#[derive(Debug)]
pub struct StreamDrain {
    label: String,
    handle: Option<JoinHandle<()>>,
}

impl StreamDrain {
    /// Start draining `reader`, discarding lines (they are logged at debug).
    pub fn discard<R>(label: impl Into<String>, reader: R) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let label = label.into();
        let log_label = label.clone();
        Self::spawn(
            label,
            reader,
            Box::new(move |line| debug!(stream = %log_label, "{}", line)),
        )
    }

    /// Start draining `reader`, forwarding every line to `sink`.
    pub fn forward<R>(label: impl Into<String>, reader: R, sink: LineSink) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        Self::spawn(label.into(), reader, sink)
    }

    fn spawn<R>(label: String, reader: R, mut sink: LineSink) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let thread_label = label.clone();
        let handle = thread::Builder::new()
            .name(format!("runctl-drain-{label}"))
            .spawn(move || {
                let mut lines = 0usize;
                let result = read_lines(reader, |line| {
                    lines += 1;
                    sink(line);
                });
                match result {
                    Ok(()) => debug!(stream = %thread_label, lines, "drain reached EOF"),
                    Err(e) => warn!(
                        stream = %thread_label,
                        lines,
                        error = %e,
                        "read error while draining stream; stopping drain"
                    ),
                }
            })?;

        Ok(Self {
            label,
            handle: Some(handle),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Wait for the drain to reach EOF.
    ///
    /// Blocks as long as the write end of the stream stays open.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(stream = %self.label, "drain thread panicked");
            }
        }
    }
}

// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are microseconds elapsed since the sink was created.

use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use prograde_core::trace::{
    BufferAcquiredEvent, CompletionPath, FramePresentedEvent, FrameSubmittedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write + Send = Box<dyn Write + Send>> {
    writer: Mutex<W>,
    started: Instant,
}

impl<W: Write + Send> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write + Send> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            started: Instant::now(),
        }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn elapsed_us(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    fn line(&self, args: std::fmt::Arguments<'_>) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{args}");
    }
}

fn path_name(path: CompletionPath) -> &'static str {
    match path {
        CompletionPath::Fence => "fence",
        CompletionPath::Query => "query",
    }
}

impl<W: Write + Send> TraceSink for PrettyPrintSink<W> {
    fn on_buffer_acquired(&self, e: &BufferAcquiredEvent) {
        self.line(format_args!(
            "[acquire] frame={} at {}µs",
            e.frame_index,
            self.elapsed_us(),
        ));
    }

    fn on_frame_submitted(&self, e: &FrameSubmittedEvent) {
        self.line(format_args!(
            "[submit] frame={} path={} at {}µs",
            e.frame_index,
            path_name(e.path),
            self.elapsed_us(),
        ));
    }

    fn on_frame_presented(&self, e: &FramePresentedEvent) {
        self.line(format_args!(
            "[present] frame={} path={} at {}µs",
            e.frame_index,
            path_name(e.path),
            self.elapsed_us(),
        ));
    }

    fn on_wait_terminated(&self) {
        self.line(format_args!("[terminate] at {}µs", self.elapsed_us()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_print_frame_cycle() {
        let sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_buffer_acquired(&BufferAcquiredEvent { frame_index: 1 });
        sink.on_frame_submitted(&FrameSubmittedEvent {
            frame_index: 1,
            path: CompletionPath::Fence,
        });
        sink.on_frame_presented(&FramePresentedEvent {
            frame_index: 1,
            path: CompletionPath::Fence,
        });

        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[acquire] frame=1"), "got: {output}");
        assert!(output.contains("[submit] frame=1 path=fence"), "got: {output}");
        assert!(output.contains("[present] frame=1 path=fence"), "got: {output}");
    }

    #[test]
    fn terminate_line() {
        let sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_wait_terminated();
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[terminate]"), "got: {output}");
    }
}

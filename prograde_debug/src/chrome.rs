// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a
//! [`RecorderSink`](super::recorder::RecorderSink) and writes
//! [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Each frame's acquire and present become a B/E duration pair named
/// `frame N` (the full in-flight span); submits and the wait-thread
/// termination become instants. Recorded timestamps are already in
/// microseconds, the format's native unit.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::BufferAcquired { at_us, frame_index } => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("frame {frame_index}"),
                    "cat": "Frame",
                    "ts": at_us,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": frame_index,
                    }
                }));
            }
            RecordedEvent::FrameSubmitted {
                at_us,
                frame_index,
                path,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Submit",
                    "cat": "Frame",
                    "ts": at_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "path": format!("{path:?}"),
                    }
                }));
            }
            RecordedEvent::FramePresented {
                at_us,
                frame_index,
                path,
            } => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("frame {frame_index}"),
                    "cat": "Frame",
                    "ts": at_us,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": frame_index,
                        "path": format!("{path:?}"),
                    }
                }));
            }
            RecordedEvent::WaitTerminated { at_us } => {
                events.push(json!({
                    "ph": "i",
                    "name": "WaitTerminated",
                    "cat": "Teardown",
                    "ts": at_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use prograde_core::trace::{
        BufferAcquiredEvent, CompletionPath, FramePresentedEvent, FrameSubmittedEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let rec = RecorderSink::new();
        rec.on_buffer_acquired(&BufferAcquiredEvent { frame_index: 1 });
        rec.on_frame_submitted(&FrameSubmittedEvent {
            frame_index: 1,
            path: CompletionPath::Query,
        });
        rec.on_frame_presented(&FramePresentedEvent {
            frame_index: 1,
            path: CompletionPath::Query,
        });

        let mut out = Vec::new();
        export(&rec.bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        // Acquire opens the frame span.
        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "frame 1");

        // Submit is an instant.
        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "Submit");

        // Present closes the span.
        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["name"], "frame 1");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}

// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Each record carries a microsecond timestamp stamped at encode time,
//! relative to the sink's creation; recording from the render thread and the
//! fence-wait thread interleaves in arrival order.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use prograde_core::trace::{
    BufferAcquiredEvent, CompletionPath, FramePresentedEvent, FrameSubmittedEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_BUFFER_ACQUIRED: u8 = 1;
const TAG_FRAME_SUBMITTED: u8 = 2;
const TAG_FRAME_PRESENTED: u8 = 3;
const TAG_WAIT_TERMINATED: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderSink {
    buf: Mutex<Vec<u8>>,
    started: Instant,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder; timestamps are measured from this call.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Mutex::new(Vec::new()),
            started: Instant::now(),
        }
    }

    /// Returns a copy of the recorded bytes.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    // -- encoding helpers --------------------------------------------------

    fn elapsed_us(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    fn record(&self, tag: u8, frame_index: u64, path: Option<CompletionPath>) {
        let at_us = self.elapsed_us();
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        buf.push(tag);
        buf.extend_from_slice(&at_us.to_le_bytes());
        buf.extend_from_slice(&frame_index.to_le_bytes());
        buf.push(match path {
            None => 0,
            Some(CompletionPath::Fence) => 1,
            Some(CompletionPath::Query) => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_buffer_acquired(&self, e: &BufferAcquiredEvent) {
        self.record(TAG_BUFFER_ACQUIRED, e.frame_index, None);
    }

    fn on_frame_submitted(&self, e: &FrameSubmittedEvent) {
        self.record(TAG_FRAME_SUBMITTED, e.frame_index, Some(e.path));
    }

    fn on_frame_presented(&self, e: &FramePresentedEvent) {
        self.record(TAG_FRAME_PRESENTED, e.frame_index, Some(e.path));
    }

    fn on_wait_terminated(&self) {
        self.record(TAG_WAIT_TERMINATED, 0, None);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A free slot was acquired.
    BufferAcquired {
        /// Microseconds since recording started.
        at_us: u64,
        /// Frame counter.
        frame_index: u64,
    },
    /// A frame's GPU work was submitted.
    FrameSubmitted {
        /// Microseconds since recording started.
        at_us: u64,
        /// Frame counter.
        frame_index: u64,
        /// Active completion path.
        path: CompletionPath,
    },
    /// A completed frame became the presenting buffer.
    FramePresented {
        /// Microseconds since recording started.
        at_us: u64,
        /// Frame counter.
        frame_index: u64,
        /// Active completion path.
        path: CompletionPath,
    },
    /// The fence-wait thread exited.
    WaitTerminated {
        /// Microseconds since recording started.
        at_us: u64,
    },
}

impl RecordedEvent {
    /// The event's timestamp in microseconds since recording started.
    #[must_use]
    pub fn at_us(&self) -> u64 {
        match self {
            Self::BufferAcquired { at_us, .. }
            | Self::FrameSubmitted { at_us, .. }
            | Self::FramePresented { at_us, .. }
            | Self::WaitTerminated { at_us } => *at_us,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_path(&mut self) -> Option<CompletionPath> {
        match self.read_u8()? {
            1 => Some(CompletionPath::Fence),
            2 => Some(CompletionPath::Query),
            _ => None,
        }
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let at_us = self.read_u64()?;
        let frame_index = self.read_u64()?;
        match tag {
            TAG_BUFFER_ACQUIRED => {
                self.read_u8()?;
                Some(RecordedEvent::BufferAcquired { at_us, frame_index })
            }
            TAG_FRAME_SUBMITTED => Some(RecordedEvent::FrameSubmitted {
                at_us,
                frame_index,
                path: self.read_path()?,
            }),
            TAG_FRAME_PRESENTED => Some(RecordedEvent::FramePresented {
                at_us,
                frame_index,
                path: self.read_path()?,
            }),
            TAG_WAIT_TERMINATED => {
                self.read_u8()?;
                Some(RecordedEvent::WaitTerminated { at_us })
            }
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

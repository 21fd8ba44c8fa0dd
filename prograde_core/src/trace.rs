// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the presentation loop.
//!
//! [`TraceSink`] has one method per frame-loop event; all bodies default to
//! no-ops, so sinks implement only the events they care about. Methods take
//! `&self` and sinks must be `Send + Sync`: presented and terminated events
//! arrive on the controller's background fence-wait thread, acquire and
//! submit events on the render thread.
//!
//! [`Tracer`] wraps an optional shared sink. Cloning is cheap (at most an
//! `Arc` bump), and every dispatch is a single `Option` branch when no sink
//! is installed.

use core::fmt;
use std::sync::Arc;

/// Which completion-detection primitive a context is using.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompletionPath {
    /// Fence path: a background thread blocks on the device's fence wait.
    Fence,
    /// Query path: the render thread polls a completion query.
    Query,
}

/// Emitted after a free buffer slot is acquired for a frame.
#[derive(Clone, Copy, Debug)]
pub struct BufferAcquiredEvent {
    /// 1-based index of the frame about to be rendered.
    pub frame_index: u64,
}

/// Emitted after a frame's GPU work has been submitted.
#[derive(Clone, Copy, Debug)]
pub struct FrameSubmittedEvent {
    /// 1-based frame index. On the fence path this is also the fence value
    /// signaled for the frame.
    pub frame_index: u64,
    /// Active completion path.
    pub path: CompletionPath,
}

/// Emitted after a completed frame has been handed to the swapchain's
/// presenting slot.
#[derive(Clone, Copy, Debug)]
pub struct FramePresentedEvent {
    /// 1-based frame index.
    pub frame_index: u64,
    /// Active completion path.
    pub path: CompletionPath,
}

/// Receives presentation-loop events.
///
/// All methods default to no-ops.
pub trait TraceSink: Send + Sync {
    /// A free buffer slot was acquired for `e.frame_index`.
    fn on_buffer_acquired(&self, e: &BufferAcquiredEvent) {
        let _ = e;
    }

    /// A frame's GPU work was submitted.
    fn on_frame_submitted(&self, e: &FrameSubmittedEvent) {
        let _ = e;
    }

    /// A completed frame became the presenting buffer.
    fn on_frame_presented(&self, e: &FramePresentedEvent) {
        let _ = e;
    }

    /// The background fence-wait thread observed the terminate sentinel and
    /// is exiting.
    fn on_wait_terminated(&self) {}
}

/// Dispatches presentation-loop events to an optional shared [`TraceSink`].
#[derive(Clone, Default)]
pub struct Tracer {
    sink: Option<Arc<dyn TraceSink>>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("active", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer dispatching to the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a tracer that discards all events.
    #[must_use]
    pub fn none() -> Self {
        Self { sink: None }
    }

    /// Emits a [`BufferAcquiredEvent`].
    #[inline]
    pub fn buffer_acquired(&self, e: &BufferAcquiredEvent) {
        if let Some(sink) = &self.sink {
            sink.on_buffer_acquired(e);
        }
    }

    /// Emits a [`FrameSubmittedEvent`].
    #[inline]
    pub fn frame_submitted(&self, e: &FrameSubmittedEvent) {
        if let Some(sink) = &self.sink {
            sink.on_frame_submitted(e);
        }
    }

    /// Emits a [`FramePresentedEvent`].
    #[inline]
    pub fn frame_presented(&self, e: &FramePresentedEvent) {
        if let Some(sink) = &self.sink {
            sink.on_frame_presented(e);
        }
    }

    /// Emits the wait-thread termination event.
    #[inline]
    pub fn wait_terminated(&self) {
        if let Some(sink) = &self.sink {
            sink.on_wait_terminated();
        }
    }
}

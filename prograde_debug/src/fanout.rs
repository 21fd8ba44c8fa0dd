// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatching one event stream to several sinks.
//!
//! A [`Tracer`](prograde_core::trace::Tracer) carries a single sink;
//! [`FanoutSink`] widens that to any number, e.g. a
//! [`PrettyPrintSink`](crate::pretty::PrettyPrintSink) for live output plus a
//! [`RecorderSink`](crate::recorder::RecorderSink) for post-mortem export.

use std::sync::Arc;

use prograde_core::trace::{
    BufferAcquiredEvent, FramePresentedEvent, FrameSubmittedEvent, TraceSink,
};

/// A [`TraceSink`] forwarding every event to each of its children, in order.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn TraceSink>>,
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl FanoutSink {
    /// Creates a fanout over the given sinks.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn TraceSink>>) -> Self {
        Self { sinks }
    }
}

impl TraceSink for FanoutSink {
    fn on_buffer_acquired(&self, e: &BufferAcquiredEvent) {
        for sink in &self.sinks {
            sink.on_buffer_acquired(e);
        }
    }

    fn on_frame_submitted(&self, e: &FrameSubmittedEvent) {
        for sink in &self.sinks {
            sink.on_frame_submitted(e);
        }
    }

    fn on_frame_presented(&self, e: &FramePresentedEvent) {
        for sink in &self.sinks {
            sink.on_frame_presented(e);
        }
    }

    fn on_wait_terminated(&self) {
        for sink in &self.sinks {
            sink.on_wait_terminated();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{RecordedEvent, RecorderSink, decode};
    use prograde_core::trace::CompletionPath;

    #[test]
    fn every_child_sees_every_event() {
        let first = Arc::new(RecorderSink::new());
        let second = Arc::new(RecorderSink::new());
        let fanout = FanoutSink::new(vec![
            Arc::clone(&first) as Arc<dyn TraceSink>,
            Arc::clone(&second) as Arc<dyn TraceSink>,
        ]);

        fanout.on_buffer_acquired(&BufferAcquiredEvent { frame_index: 1 });
        fanout.on_frame_presented(&FramePresentedEvent {
            frame_index: 1,
            path: CompletionPath::Fence,
        });
        fanout.on_wait_terminated();

        for rec in [&first, &second] {
            let events: Vec<_> = decode(&rec.bytes()).collect();
            assert_eq!(events.len(), 3);
            assert!(matches!(events[0], RecordedEvent::BufferAcquired { .. }));
            assert!(matches!(events[2], RecordedEvent::WaitTerminated { .. }));
        }
    }
}

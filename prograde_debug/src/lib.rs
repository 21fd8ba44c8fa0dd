// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for prograde
//! diagnostics.
//!
//! This crate provides [`TraceSink`](prograde_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`] — compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from
//!   recorded bytes.
//! - [`fanout::FanoutSink`] — dispatches one event stream to several sinks.
//!
//! All sinks use interior mutability: presentation events can arrive on the
//! controller's background fence-wait thread, so [`TraceSink`](prograde_core::trace::TraceSink)
//! methods take `&self`. Timestamps are microseconds elapsed since sink
//! creation, stamped by the sink itself.

pub mod chrome;
pub mod fanout;
pub mod pretty;
pub mod recorder;

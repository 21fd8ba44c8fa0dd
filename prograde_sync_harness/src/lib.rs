// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated GPU device and presentation metrics for demos and tests.
//!
//! - [`sim`] — [`SimulatedGpu`](sim::SimulatedGpu): a
//!   [`RenderBackend`](prograde_core::device::RenderBackend) whose fences
//!   and queries complete on a configurable delay, with pathology toggles
//!   for stress runs.
//! - [`metrics`] — [`PresentTracker`](metrics::PresentTracker): rolling
//!   submit-to-present latency window with miss counting, letter grading,
//!   and an ASCII sparkline for HUD rendering.

pub mod metrics;
pub mod sim;

// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A simulated GPU device.
//!
//! [`SimulatedGpu`] implements
//! [`RenderBackend`](prograde_core::device::RenderBackend) over plain
//! [`TextureSlot`] values. Its fence completes signaled values on a timer
//! thread after a configurable latency; its query reports completion once the
//! same latency has elapsed. [`PathologyToggles`] distort that latency for
//! stress runs: a periodic stall and deterministic jitter.
//!
//! Everything is deterministic apart from wall-clock scheduling, so tests
//! can assert on ordering and counts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use prograde_core::device::{
    CompletionQuery, FrameDescriptor, FrameFence, RenderBackend,
};

/// Runtime pathology toggles for stress tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathologyToggles {
    /// Every eighth frame stalls for eight times the base latency.
    pub gpu_stall: bool,
    /// Per-frame latency varies by up to half the base latency.
    pub latency_jitter: bool,
}

/// Shape of the simulated device.
#[derive(Clone, Copy, Debug)]
pub struct GpuProfile {
    /// Base GPU completion latency per frame.
    pub latency: Duration,
    /// Latency distortions.
    pub toggles: PathologyToggles,
    /// Whether the device exposes a fence.
    pub fences: bool,
    /// Whether the device exposes a completion query.
    pub queries: bool,
}

impl Default for GpuProfile {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(2),
            toggles: PathologyToggles::default(),
            fences: true,
            queries: true,
        }
    }
}

/// One GPU-backed buffer slot: an id plus the frame last drawn into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureSlot {
    /// Slot identity, stable across recycling.
    pub id: u32,
    /// Frame counter stamped by the last flush, 0 before any.
    pub frame: u64,
}

/// Creates `count` texture slots with ids `0..count`.
#[must_use]
pub fn texture_slots(count: u32) -> Vec<TextureSlot> {
    (0..count).map(|id| TextureSlot { id, frame: 0 }).collect()
}

/// Per-frame latency model shared by the fence and query sides.
#[derive(Debug)]
struct LatencyModel {
    base: Duration,
    toggles: PathologyToggles,
    ticks: AtomicU64,
}

impl LatencyModel {
    fn new(profile: &GpuProfile) -> Self {
        Self {
            base: profile.latency,
            toggles: profile.toggles,
            ticks: AtomicU64::new(0),
        }
    }

    fn next_latency(&self) -> Duration {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        let mut latency = self.base;
        if self.toggles.gpu_stall && tick % 8 == 7 {
            latency *= 8;
        }
        if self.toggles.latency_jitter {
            // xorshift keeps the jitter deterministic per tick.
            let mut x = tick.wrapping_add(0x9E37_79B9_7F4A_7C15);
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            let half = self.base / 2;
            latency += half.mul_f64((x % 1000) as f64 / 1000.0);
        }
        latency
    }
}

struct FenceState {
    completed: Mutex<u64>,
    signaled: Condvar,
}

/// Simulated [`FrameFence`]: each signal completes on a timer thread after
/// the model's latency.
struct SimFence {
    state: Arc<FenceState>,
    model: Arc<LatencyModel>,
}

impl FrameFence for SimFence {
    fn signal(&self, value: u64) {
        let state = Arc::clone(&self.state);
        let latency = self.model.next_latency();
        thread::spawn(move || {
            thread::sleep(latency);
            let mut completed = state
                .completed
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *completed = (*completed).max(value);
            drop(completed);
            state.signaled.notify_all();
        });
    }

    fn wait(&self, value: u64) {
        let mut completed = self
            .state
            .completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *completed < value {
            completed = self
                .state
                .signaled
                .wait(completed)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Simulated [`CompletionQuery`]: complete once the model's latency has
/// elapsed after `end`.
struct SimQuery {
    model: Arc<LatencyModel>,
    done_at: Option<Instant>,
}

impl CompletionQuery for SimQuery {
    fn begin(&mut self) {
        self.done_at = None;
    }

    fn end(&mut self) {
        self.done_at = Some(Instant::now() + self.model.next_latency());
    }

    fn poll(&mut self) -> bool {
        self.done_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// A [`RenderBackend`] over [`TextureSlot`] with simulated completion timing.
#[derive(Debug)]
pub struct SimulatedGpu {
    profile: GpuProfile,
    model: Arc<LatencyModel>,
    frames_begun: u64,
    frames_flushed: u64,
    frames_submitted: u64,
}

impl SimulatedGpu {
    /// Creates a device with the given profile.
    #[must_use]
    pub fn new(profile: GpuProfile) -> Self {
        Self {
            model: Arc::new(LatencyModel::new(&profile)),
            profile,
            frames_begun: 0,
            frames_flushed: 0,
            frames_submitted: 0,
        }
    }

    /// Number of frames submitted so far.
    #[must_use]
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }
}

impl Default for SimulatedGpu {
    fn default() -> Self {
        Self::new(GpuProfile::default())
    }
}

impl RenderBackend for SimulatedGpu {
    type Target = TextureSlot;

    fn begin_frame(&mut self, _descriptor: &FrameDescriptor) {
        self.frames_begun += 1;
    }

    fn flush(&mut self, target: &mut TextureSlot) {
        self.frames_flushed += 1;
        target.frame = self.frames_flushed;
    }

    fn submit(&mut self) {
        self.frames_submitted += 1;
    }

    fn create_fence(&self, initial: u64) -> Option<Arc<dyn FrameFence>> {
        if !self.profile.fences {
            return None;
        }
        Some(Arc::new(SimFence {
            state: Arc::new(FenceState {
                completed: Mutex::new(initial),
                signaled: Condvar::new(),
            }),
            model: Arc::clone(&self.model),
        }))
    }

    fn create_query(&self) -> Option<Box<dyn CompletionQuery>> {
        if !self.profile.queries {
            return None;
        }
        Some(Box::new(SimQuery {
            model: Arc::clone(&self.model),
            done_at: None,
        }))
    }
}

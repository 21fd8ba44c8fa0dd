// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trait contracts for the GPU backend.
//!
//! The rasterizer, device, and command queue are external collaborators.
//! This module defines the narrow surface the presentation subsystem needs
//! from them:
//!
//! - [`RenderBackend`] — frame bracketing (`begin_frame`/`flush`/`submit`)
//!   and capability probes for the two completion primitives.
//! - [`FrameFence`] — a GPU-side monotonic counter with a CPU blocking wait
//!   (`ID3D11Fence`, `MTLSharedEvent`, timeline semaphores).
//! - [`CompletionQuery`] — a primitive bracketing a span of GPU work and
//!   polled until the GPU reports it finished (`D3D11_QUERY_EVENT` and
//!   friends), for devices without fences.
//!
//! Device and queue handles are borrowed by this subsystem, never owned;
//! they must outlive every context created over them.

use std::sync::Arc;

/// Render target dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TargetSize {
    /// Creates a target size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` when either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// What happens to existing target contents when a frame begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadAction {
    /// Clear the target to the given 0xAARRGGBB color.
    Clear {
        /// Clear color, 0xAARRGGBB.
        color: u32,
    },
    /// Preserve the target's previous contents.
    Preserve,
}

/// Per-frame parameters passed to [`RenderBackend::begin_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameDescriptor {
    /// Render target dimensions.
    pub size: TargetSize,
    /// Load action for the target's existing contents.
    pub load_action: LoadAction,
}

/// A GPU-side monotonic counter with a CPU-side blocking wait.
///
/// Values are signaled in strictly increasing order, one per frame, and
/// consumed in the same order: the controller never waits on frame N+1's
/// value before frame N has been presented.
pub trait FrameFence: Send + Sync {
    /// Enqueues a GPU-side signal of `value` behind all previously submitted
    /// work. Returns immediately; the GPU performs the signal when it gets
    /// there.
    fn signal(&self, value: u64);

    /// Blocks the calling thread until the GPU has signaled a value
    /// greater than or equal to `value`.
    fn wait(&self, value: u64);
}

/// A completion primitive bracketing one frame's GPU work, polled until the
/// GPU reports it finished.
///
/// Used when the device exposes no fence. One query instance is reused
/// across frames; `begin`/`end` re-arm it.
pub trait CompletionQuery: Send {
    /// Opens the bracket before the frame's work is recorded.
    fn begin(&mut self);

    /// Closes the bracket after the frame's work is recorded.
    fn end(&mut self);

    /// Returns `true` once the GPU has finished everything inside the
    /// bracket. Non-blocking.
    fn poll(&mut self) -> bool;
}

/// The GPU rendering backend driving one output surface.
///
/// Implementations wrap a concrete device and command queue. The
/// presentation subsystem calls `begin_frame` once per frame, lets the
/// embedder record draw work, then `flush` directs that work at a target
/// slot and `submit` pushes the frame's command stream to the GPU.
pub trait RenderBackend {
    /// One GPU-backed buffer slot (a texture, an image, a drawable).
    type Target: Send + 'static;

    /// Opens a frame with the given target size and load action.
    fn begin_frame(&mut self, descriptor: &FrameDescriptor);

    /// Directs the recorded frame at `target`.
    fn flush(&mut self, target: &mut Self::Target);

    /// Pushes the frame's command stream to the GPU for execution.
    fn submit(&mut self);

    /// Creates a frame fence starting at `initial`, or `None` when the
    /// device has no fence primitive.
    fn create_fence(&self, initial: u64) -> Option<Arc<dyn FrameFence>> {
        let _ = initial;
        None
    }

    /// Creates a completion query, or `None` when the device has no query
    /// primitive.
    fn create_query(&self) -> Option<Box<dyn CompletionQuery>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::TargetSize;

    #[test]
    fn empty_target_detection() {
        assert!(TargetSize::new(0, 1080).is_empty());
        assert!(TargetSize::new(1920, 0).is_empty());
        assert!(!TargetSize::new(1920, 1080).is_empty());
    }
}

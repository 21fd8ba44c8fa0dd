// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-surface entry point.
//!
//! [`SurfaceContext`] ties one output surface's pieces together: the
//! backend, the [`Swapchain`] and the [`PresentController`] built over it.
//! Each surface gets its own context; there is no process-wide registry and
//! no global state. Embedders with several outputs create several contexts,
//! each probing its own backend.
//!
//! The context lives on the render thread. The compositor thread gets its
//! half through [`SurfaceContext::swapchain`] and reads frames with
//! [`Swapchain::presenting`] on its own schedule.

use core::fmt;
use std::sync::Arc;

use crate::controller::{ControllerConfig, ControllerError, FrameReadyFn, PresentController};
use crate::device::{FrameDescriptor, LoadAction, RenderBackend, TargetSize};
use crate::swapchain::{Swapchain, SwapchainError};
use crate::trace::{CompletionPath, Tracer};

/// Errors from [`SurfaceContext`] construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextError {
    /// The target size has a zero dimension.
    EmptyTarget {
        /// The rejected size.
        size: TargetSize,
    },
    /// The slot set could not form a swapchain.
    Swapchain(SwapchainError),
    /// The controller could not be created over the backend.
    Controller(ControllerError),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTarget { size } => {
                write!(f, "target size {}x{} has a zero dimension", size.width, size.height)
            }
            Self::Swapchain(_) => write!(f, "failed to construct the swapchain"),
            Self::Controller(_) => write!(f, "failed to construct the present controller"),
        }
    }
}

impl core::error::Error for ContextError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::EmptyTarget { .. } => None,
            Self::Swapchain(e) => Some(e),
            Self::Controller(e) => Some(e),
        }
    }
}

impl From<SwapchainError> for ContextError {
    fn from(e: SwapchainError) -> Self {
        Self::Swapchain(e)
    }
}

impl From<ControllerError> for ContextError {
    fn from(e: ControllerError) -> Self {
        Self::Controller(e)
    }
}

/// One output surface: backend, swapchain, and controller, bound together.
///
/// Frame loop, on the render thread:
///
/// 1. [`begin_frame`](Self::begin_frame) with the frame's load action,
/// 2. record draw work against the backend,
/// 3. [`end_frame`](Self::end_frame) to flush, submit, and arrange
///    completion-gated presentation.
pub struct SurfaceContext<B: RenderBackend> {
    backend: B,
    swapchain: Arc<Swapchain<B::Target>>,
    controller: PresentController<B::Target>,
    size: TargetSize,
}

impl<B: RenderBackend> fmt::Debug for SurfaceContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceContext")
            .field("size", &self.size)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl<B: RenderBackend> SurfaceContext<B> {
    /// Creates a context for one surface.
    ///
    /// `slots` is the full buffer set (first slot presents initially); `size`
    /// is the surface's pixel dimensions; `on_frame_ready` is invoked once
    /// per presented frame, possibly on the controller's wait thread.
    ///
    /// # Errors
    ///
    /// Rejects zero-sized targets and propagates swapchain and controller
    /// construction failures.
    pub fn new(
        backend: B,
        slots: impl IntoIterator<Item = B::Target>,
        size: TargetSize,
        on_frame_ready: FrameReadyFn,
        config: ControllerConfig,
        tracer: Tracer,
    ) -> Result<Self, ContextError> {
        if size.is_empty() {
            return Err(ContextError::EmptyTarget { size });
        }
        let swapchain = Arc::new(Swapchain::new(slots)?);
        let controller = PresentController::new(
            &backend,
            Arc::clone(&swapchain),
            on_frame_ready,
            config,
            tracer,
        )?;
        Ok(Self {
            backend,
            swapchain,
            controller,
            size,
        })
    }

    /// Opens a frame on the backend with this surface's size and the given
    /// load action.
    pub fn begin_frame(&mut self, load_action: LoadAction) {
        self.backend.begin_frame(&FrameDescriptor {
            size: self.size,
            load_action,
        });
    }

    /// Finishes the frame: acquires a slot, flushes, submits, and presents
    /// once the GPU completes. See [`PresentController::end_frame`] for the
    /// per-path blocking behavior.
    pub fn end_frame(&mut self) {
        self.controller.end_frame(&mut self.backend);
    }

    /// Runs `f` over the current presenting slot under the chain mutex.
    ///
    /// Convenience over [`Swapchain::presenting`] for same-thread reads;
    /// the compositor thread should clone [`swapchain`](Self::swapchain)
    /// instead.
    pub fn with_presenting<R>(&self, f: impl FnOnce(&B::Target) -> R) -> R {
        f(&self.swapchain.presenting())
    }

    /// Shared handle to the swapchain, for the compositor thread.
    #[must_use]
    pub fn swapchain(&self) -> Arc<Swapchain<B::Target>> {
        Arc::clone(&self.swapchain)
    }

    /// The surface's pixel dimensions.
    #[must_use]
    pub fn target_size(&self) -> TargetSize {
        self.size
    }

    /// Which completion primitive the controller selected.
    #[must_use]
    pub fn completion_path(&self) -> CompletionPath {
        self.controller.completion_path()
    }

    /// Number of frames submitted so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.controller.frame_count()
    }

    /// Exclusive access to the backend, for recording draw work between
    /// [`begin_frame`](Self::begin_frame) and [`end_frame`](Self::end_frame).
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

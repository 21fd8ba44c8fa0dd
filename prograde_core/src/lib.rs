// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Completion-gated GPU frame hand-off and presentation synchronization.
//!
//! `prograde_core` sits between a render thread and a host compositor that
//! share a small pool of GPU-backed buffer slots. The render thread draws
//! into free slots; the compositor reads whichever slot is currently
//! *presenting*, from its own thread, with no cooperative signaling beyond a
//! single "frame ready" callback. This crate guarantees that the compositor
//! never observes a half-written slot, that the render thread never corrupts
//! a slot being displayed, and that true GPU completion (not mere CPU
//! submission) gates when a slot becomes presentable.
//!
//! # Architecture
//!
//! Each frame flows through three cooperating pieces:
//!
//! ```text
//!   render thread                                 compositor thread
//!       │                                                ▲
//!       ▼                                                │ scoped read
//!   Swapchain::acquire ──► GPU work ──► fence/query ──► Swapchain::present
//!       ▲                                 (completion)          │
//!       └──────────────── free pool ◄───────────────────────────┘
//! ```
//!
//! **[`swapchain`]** — `Swapchain<T>`: one presenting slot plus a
//! condition-variable guarded free pool. Blocking acquire, atomic
//! present-and-recycle, and RAII scoped reads of the presenting slot.
//!
//! **[`ring`]** — `ReadWriteRing`: independent read/write cursors over a
//! fixed modulus, for backends that exchange slot *indices* instead of
//! physically moving resources.
//!
//! **[`controller`]** — `PresentController<T>`: per-frame orchestration.
//! Acquires a slot, directs GPU work at it, detects completion through a
//! fence (preferred, on a dedicated wait thread) or a polled query
//! (fallback), then presents and notifies the host.
//!
//! **[`context`]** — `SurfaceContext<B>`: explicit per-output-surface
//! object owning the swapchain and controller. There is no process-wide
//! state; the embedding layer owns every context it creates.
//!
//! **[`device`]** — trait contracts for the GPU backend
//! ([`RenderBackend`](device::RenderBackend), [`FrameFence`](device::FrameFence),
//! [`CompletionQuery`](device::CompletionQuery)) and the frame descriptor
//! types exchanged with it.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, dispatched through a clonable
//! [`Tracer`](trace::Tracer).
//!
//! # Threading
//!
//! Three native threads touch a context: the render thread (owned by the
//! embedder), one background fence-wait thread per context (spawned by the
//! controller, fence path only), and the compositor's own thread. All
//! synchronization is OS mutexes and condition variables; there is no async
//! runtime.

pub mod context;
pub mod controller;
pub mod device;
pub mod ring;
pub mod swapchain;
pub mod trace;

mod sync;

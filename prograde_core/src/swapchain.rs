// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-slot buffer exchange between one producer and one presenting reader.
//!
//! [`Swapchain`] owns a fixed set of buffer slots: exactly one *presenting*
//! slot (the frame the compositor reads) and a pool of *free* slots the
//! render thread draws into. Slots move between the two through
//! [`acquire`](Swapchain::acquire) and [`present`](Swapchain::present); the
//! compositor reads the presenting slot through the RAII
//! [`presenting`](Swapchain::presenting) guard, which holds the same mutex
//! `present` mutates under.
//!
//! At every instant each slot is owned by exactly one party: the free pool,
//! the render thread (between `acquire` and `present`), the presenting
//! position, or the compositor for the duration of a scoped read.

use core::fmt;
use core::ops::Deref;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::sync::{lock, wait};

/// Errors from [`Swapchain`] construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapchainError {
    /// Fewer than two slots were supplied.
    ///
    /// With one slot presenting and one being drawn into, a chain of fewer
    /// than two slots could never hand out a free buffer.
    TooFewSlots {
        /// Number of slots the caller supplied.
        provided: usize,
    },
}

impl fmt::Display for SwapchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewSlots { provided } => {
                write!(f, "swapchain needs at least 2 slots, got {provided}")
            }
        }
    }
}

impl core::error::Error for SwapchainError {}

struct Slots<T> {
    presenting: T,
    free: VecDeque<T>,
}

/// Thread-safe exchange of buffer ownership between a render thread and a
/// presenting reader.
///
/// The pool depth (slot count minus the presenting slot) absorbs the
/// compositor's unpredictable read timing: three slots suffice in the common
/// case, four where compositor read latency is high.
///
/// # Example
///
/// ```
/// use prograde_core::swapchain::Swapchain;
///
/// let chain = Swapchain::new([0_u32, 1, 2])?;
/// let slot = chain.acquire();
/// // ... draw into `slot` and wait for the GPU ...
/// chain.present(slot);
/// assert_eq!(*chain.presenting(), 1);
/// # Ok::<(), prograde_core::swapchain::SwapchainError>(())
/// ```
pub struct Swapchain<T> {
    slots: Mutex<Slots<T>>,
    free_cond: Condvar,
}

impl<T> fmt::Debug for Swapchain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Swapchain")
            .field("free_len", &self.free_len())
            .finish_non_exhaustive()
    }
}

impl<T> Swapchain<T> {
    /// Creates a swapchain from the full slot set.
    ///
    /// The first slot becomes the initial presenting slot; the rest form the
    /// free pool.
    ///
    /// # Errors
    ///
    /// Returns [`SwapchainError::TooFewSlots`] when fewer than two slots are
    /// supplied.
    pub fn new(slots: impl IntoIterator<Item = T>) -> Result<Self, SwapchainError> {
        let mut free: VecDeque<T> = slots.into_iter().collect();
        let provided = free.len();
        let Some(presenting) = free.pop_front() else {
            return Err(SwapchainError::TooFewSlots { provided });
        };
        if free.is_empty() {
            return Err(SwapchainError::TooFewSlots { provided });
        }
        Ok(Self {
            slots: Mutex::new(Slots { presenting, free }),
            free_cond: Condvar::new(),
        })
    }

    /// Blocks until the free pool is non-empty, then pops and returns one
    /// slot.
    ///
    /// Never returns the presenting slot. The wait is a condition-variable
    /// wait released by [`present`](Self::present); there is no timeout. The
    /// caller owns the returned slot exclusively until handing it back
    /// through `present`.
    pub fn acquire(&self) -> T {
        let mut slots = lock(&self.slots);
        loop {
            if let Some(buffer) = slots.free.pop_front() {
                return buffer;
            }
            slots = wait(&self.free_cond, slots);
        }
    }

    /// Pops a free slot without blocking, or returns `None` when all slots
    /// are in flight.
    pub fn try_acquire(&self) -> Option<T> {
        lock(&self.slots).free.pop_front()
    }

    /// Makes `buffer` the new presenting slot and recycles the previous one.
    ///
    /// Atomically, under the chain mutex: the outgoing presenting slot is
    /// pushed onto the free pool and `buffer` takes its place. All threads
    /// blocked in [`acquire`](Self::acquire) are woken afterwards.
    ///
    /// `buffer` must have been obtained from [`acquire`](Self::acquire) on
    /// this chain; presenting a slot the chain already holds would alias it.
    pub fn present(&self, buffer: T) {
        {
            let mut slots = lock(&self.slots);
            let previous = core::mem::replace(&mut slots.presenting, buffer);
            slots.free.push_back(previous);
        }
        self.free_cond.notify_all();
    }

    /// Returns a scoped read of the current presenting slot.
    ///
    /// The chain mutex is held for the guard's lifetime, so a concurrent
    /// [`present`](Self::present) cannot swap the slot mid-read. Keep the
    /// scope tight: the render pipeline stalls on `present` while the guard
    /// is alive.
    pub fn presenting(&self) -> PresentingGuard<'_, T> {
        PresentingGuard {
            slots: lock(&self.slots),
        }
    }

    /// Number of slots currently in the free pool.
    pub fn free_len(&self) -> usize {
        lock(&self.slots).free.len()
    }
}

/// RAII read access to the presenting slot.
///
/// Returned by [`Swapchain::presenting`]. Dereferences to the slot; the
/// chain mutex is released when the guard drops.
pub struct PresentingGuard<'a, T> {
    slots: MutexGuard<'a, Slots<T>>,
}

impl<T> Deref for PresentingGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.slots.presenting
    }
}

impl<T: fmt::Debug> fmt::Debug for PresentingGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PresentingGuard").field(&**self).finish()
    }
}

// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Independent read/write cursors over a fixed modulus.
//!
//! Some backends cannot physically move a buffer through the
//! [`Swapchain`](crate::swapchain::Swapchain) — the resource lives in
//! backend-owned storage and only a *slot index* is exchanged between the
//! writer and the reader. [`ReadWriteRing`] hands out those indices: each
//! cursor advances modulo the ring size under a short-held lock, and the two
//! cursors never interact.
//!
//! The ring carries no ownership semantics and applies no backpressure: a
//! writer that advances faster than its reader consumes will silently lap
//! it. Callers that need strict exclusion must layer the swapchain's
//! blocking-acquire pattern on top.

use core::fmt;
use std::sync::Mutex;

use crate::sync::lock;

/// Ring size used by [`ReadWriteRing::default`].
pub const DEFAULT_RING_SIZE: u32 = 3;

struct Cursors {
    read: u32,
    write: u32,
}

/// Thread-safe read/write cursor pair advancing modulo a fixed size.
///
/// Both cursors start at 0. Each accessor locks only for the duration of the
/// read-or-advance, never across the caller's work on the slot.
pub struct ReadWriteRing {
    size: u32,
    cursors: Mutex<Cursors>,
}

impl fmt::Debug for ReadWriteRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadWriteRing")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Default for ReadWriteRing {
    fn default() -> Self {
        Self::new(DEFAULT_RING_SIZE)
    }
}

impl ReadWriteRing {
    /// Creates a ring with the given modulus.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    #[must_use]
    pub fn new(size: u32) -> Self {
        assert!(size > 0, "ring size must not be zero");
        Self {
            size,
            cursors: Mutex::new(Cursors { read: 0, write: 0 }),
        }
    }

    /// Returns the ring modulus.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Advances the write cursor and returns its new value.
    pub fn next_write(&self) -> u32 {
        let mut cursors = lock(&self.cursors);
        cursors.write = (cursors.write + 1) % self.size;
        cursors.write
    }

    /// Returns the write cursor without advancing it.
    pub fn current_write(&self) -> u32 {
        lock(&self.cursors).write
    }

    /// Advances the read cursor and returns its new value.
    pub fn next_read(&self) -> u32 {
        let mut cursors = lock(&self.cursors);
        cursors.read = (cursors.read + 1) % self.size;
        cursors.read
    }

    /// Returns the read cursor without advancing it.
    pub fn current_read(&self) -> u32 {
        lock(&self.cursors).read
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_RING_SIZE, ReadWriteRing};

    #[test]
    fn default_ring_size_is_three() {
        let ring = ReadWriteRing::default();
        assert_eq!(ring.size(), DEFAULT_RING_SIZE);
        assert_eq!(ring.size(), 3);
    }

    #[test]
    #[should_panic(expected = "ring size must not be zero")]
    fn zero_size_panics() {
        let _ = ReadWriteRing::new(0);
    }

    #[test]
    fn write_cursor_advances_and_wraps() {
        let ring = ReadWriteRing::new(3);
        assert_eq!(ring.current_write(), 0);
        assert_eq!(ring.next_write(), 1);
        assert_eq!(ring.next_write(), 2);
        assert_eq!(ring.next_write(), 0);
        assert_eq!(ring.current_write(), 0);
    }

    #[test]
    fn cursors_are_independent() {
        let ring = ReadWriteRing::new(3);
        assert_eq!(ring.next_write(), 1);
        assert_eq!(ring.next_write(), 2);
        assert_eq!(ring.current_read(), 0);
        assert_eq!(ring.next_read(), 1);
        assert_eq!(ring.current_write(), 2);
    }

    #[test]
    fn writer_may_lap_reader() {
        // Permissive by design: four writes on a size-3 ring revisit slot 1
        // while the reader still sits at 0.
        let ring = ReadWriteRing::new(3);
        let mut last = 0;
        for _ in 0..4 {
            last = ring.next_write();
        }
        assert_eq!(last, 1);
        assert_eq!(ring.current_read(), 0);
    }
}

// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Poison-tolerant lock helpers.
//!
//! A panic on the render thread mid-frame poisons the locks shared with the
//! fence-wait thread and the compositor. Recovering the inner guard keeps
//! scoped reads and teardown (sentinel + join) functional after such a
//! panic; every protected structure remains valid at each unlock point.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn wait<'a, T>(cond: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    cond.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

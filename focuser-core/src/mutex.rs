// SPDX-License-Identifier: MIT

//! Scoped critical-section mutex.
//!
//! Shared device state crosses the boundary between the timer
//! interrupt, the USB control-request handler and the foreground loop.
//! All of it lives behind this wrapper: acquiring the lock enters a
//! global critical section (interrupts disabled on the single-core
//! target), so multi-byte reads and writes can never be torn by the
//! tick handler.

use core::cell::RefCell;
use critical_section::Mutex as CsMutex;

pub struct Mutex<T> {
    inner: CsMutex<RefCell<T>>,
}

impl<T> Mutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: CsMutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access to the value.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn get_cloned(&self) -> T
    where
        T: Clone,
    {
        self.lock(|value| value.clone())
    }

    pub fn set(&self, value: T) {
        self.lock(|slot| *slot = value);
    }
}

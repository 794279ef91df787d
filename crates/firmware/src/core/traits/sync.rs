//! Locked access to state reached from both tasks and the decode interrupt.
//!
//! The config mailboxes and the installed driver table sit behind
//! `SharedState` so the same code runs against a critical section on target
//! and a bare `RefCell` in host tests.

use core::cell::RefCell;

/// Closure-scoped access to a value guarded by the implementor
pub trait SharedState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

/// Guarded by a critical section; usable from a `static` and from interrupts
#[cfg(feature = "embassy")]
pub struct EmbassyState<T> {
    lock: embassy_sync::blocking_mutex::CriticalSectionMutex<RefCell<T>>,
}

#[cfg(feature = "embassy")]
impl<T> EmbassyState<T> {
    pub const fn new(value: T) -> Self {
        Self {
            lock: embassy_sync::blocking_mutex::CriticalSectionMutex::new(RefCell::new(value)),
        }
    }
}

#[cfg(feature = "embassy")]
impl<T> SharedState<T> for EmbassyState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.lock.lock(|cell| f(&cell.borrow()))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        self.lock.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

/// Host-test stand-in; a nested mutable access panics
pub struct MockState<T> {
    cell: RefCell<T>,
}

impl<T> MockState<T> {
    pub const fn new(value: T) -> Self {
        Self {
            cell: RefCell::new(value),
        }
    }
}

impl<T> SharedState<T> for MockState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.cell.borrow())
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.cell.borrow_mut())
    }
}

//! Single-slot configuration mailbox
//!
//! Configuration changes are posted from any context and picked up by the
//! owning task at its next cycle boundary. A newer post replaces one that
//! has not been taken yet.

use core::marker::PhantomData;

use crate::core::traits::SharedState;

pub struct Mailbox<T, S> {
    slot: S,
    _value: PhantomData<T>,
}

impl<T, S> Mailbox<T, S>
where
    S: SharedState<Option<T>>,
{
    /// Wrap an empty slot
    pub const fn new(slot: S) -> Self {
        Self {
            slot,
            _value: PhantomData,
        }
    }

    /// Post a value, replacing any pending one
    pub fn put(&self, value: T) {
        self.slot.with_mut(|slot| *slot = Some(value));
    }

    pub fn take(&self) -> Option<T> {
        self.slot.with_mut(Option::take)
    }

    /// Drop a pending post; true if there was one
    pub fn discard(&self) -> bool {
        self.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.with(Option::is_some)
    }
}

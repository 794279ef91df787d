//! Transmission relay output

use core::cell::Cell;

/// Digital output driving the gear-change relay
pub trait RelayOutput {
    fn set_engaged(&self, engaged: bool);
}

impl<T: RelayOutput + ?Sized> RelayOutput for &T {
    fn set_engaged(&self, engaged: bool) {
        (**self).set_engaged(engaged)
    }
}

/// Mock relay remembering its level and switch count
#[derive(Default)]
pub struct MockRelay {
    engaged: Cell<bool>,
    switches: Cell<u32>,
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.get()
    }

    pub fn switch_count(&self) -> u32 {
        self.switches.get()
    }
}

impl RelayOutput for MockRelay {
    fn set_engaged(&self, engaged: bool) {
        self.engaged.set(engaged);
        self.switches.set(self.switches.get() + 1);
    }
}

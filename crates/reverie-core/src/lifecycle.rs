//! Mounted/torn-down tracking and the single-flight transition guard.

/// Tracks whether the engine is still mounted. Every deferred
/// continuation checks this before touching state or resources, so
/// nothing can write to a torn-down engine.
#[derive(Debug)]
pub struct Lifecycle {
    mounted: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self { mounted: true }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn mount(&mut self) {
        self.mounted = true;
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    /// Gate for a named operation; logs when the engine is already gone.
    pub fn ensure(&self, what: &str) -> bool {
        if !self.mounted {
            log::debug!("[lifecycle] {what} after teardown; ignoring");
        }
        self.mounted
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Boolean single-flight guard for transitions. At most one transition
/// is in flight; `release` is called unconditionally on every exit path.
#[derive(Debug, Default)]
pub struct TransitionFlag {
    active: bool,
}

impl TransitionFlag {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns false (and changes nothing) when a transition is already
    /// in flight.
    pub fn try_begin(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        true
    }

    pub fn release(&mut self) {
        self.active = false;
    }
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Shared record of what happened to the resources of a
/// [`MemoryDriver`](crate::MemoryDriver), with switches to inject failures.
///
/// The `fail_*` switches apply to the next matching call only.
#[derive(Debug, Default)]
pub struct MemoryProbe {
    pub created: AtomicUsize,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub disposed: AtomicUsize,
    pub begins: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub transactions_disposed: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_open: AtomicBool,
    pub fail_close: AtomicBool,
    pub fail_begin: AtomicBool,
    pub fail_commit: AtomicBool,
    /// Makes `open_async` pend forever, it never fails.
    pub stall_open: AtomicBool,
}

impl MemoryProbe {
    pub fn fail_next_create(&self) {
        self.fail_create.store(true, Ordering::Relaxed);
    }

    pub fn fail_next_open(&self) {
        self.fail_open.store(true, Ordering::Relaxed);
    }

    pub fn fail_next_close(&self) {
        self.fail_close.store(true, Ordering::Relaxed);
    }

    pub fn fail_next_begin(&self) {
        self.fail_begin.store(true, Ordering::Relaxed);
    }

    pub fn fail_next_commit(&self) {
        self.fail_commit.store(true, Ordering::Relaxed);
    }

    pub fn stall_opens(&self, stall: bool) {
        self.stall_open.store(stall, Ordering::Relaxed);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::Relaxed)
    }

    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::Relaxed)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::Relaxed)
    }

    pub fn transactions_disposed(&self) -> usize {
        self.transactions_disposed.load(Ordering::Relaxed)
    }

    pub(crate) fn take_failure(&self, switch: &AtomicBool) -> bool {
        switch.swap(false, Ordering::Relaxed)
    }
}

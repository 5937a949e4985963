use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

pub const UNLOAD_WARNING: &str = "Operation in progress - are you sure you want to leave?";

/// Tracks in-flight network operations so the host can warn before leaving.
#[derive(Debug, Clone, Default)]
pub struct BusyState {
    in_flight: Arc<AtomicUsize>,
}

impl BusyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an operation as in flight until the returned guard is dropped.
    #[must_use = "the busy flag is released as soon as the guard is dropped"]
    pub fn acquire(&self, operation: &'static str) -> BusyGuard {
        let previous = self.in_flight.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(operation, in_flight = previous + 1, "busy");
        BusyGuard {
            in_flight: Arc::clone(&self.in_flight),
            operation,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// The navigation warning to show, if anything is in flight.
    pub fn unload_warning(&self) -> Option<&'static str> {
        self.is_busy().then_some(UNLOAD_WARNING)
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    in_flight: Arc<AtomicUsize>,
    operation: &'static str,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(operation = self.operation, in_flight = previous - 1, "idle");
    }
}

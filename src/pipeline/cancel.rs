use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::sync::Arc;

/// Shared flag checked once per line by every pipeline and worker
#[derive(Clone, Debug)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

//! Abort handling (C9): a shared flag the supervisor polls between
//! dispatch iterations, set by either the global deadline or a process
//! termination signal.
//!
//! REDESIGN FLAGS: replaces a signal-handler-captured closure with an
//! atomic boolean observed cooperatively, so in-flight probes are never
//! forcibly cancelled (spec section 5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

use core::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOP_REQUESTED: u8 = 2;

/// The `running` flag shared between the lifecycle coordinator and the presentation loop.
///
/// It moves `idle -> running -> stop requested` and never back, so it reads true exactly
/// once per lifetime. Every access is sequentially consistent.
#[derive(Debug, Default)]
pub struct RunningFlag(AtomicU8);

impl RunningFlag {
    /// Creates a flag that reads false and has not been started.
    pub const fn new() -> Self {
        Self(AtomicU8::new(IDLE))
    }

    /// Sets the flag to true. Returns false if it was already started.
    pub fn start(&self) -> bool {
        self.0
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Sets the flag back to false. Returns false if it was not running.
    pub fn request_stop(&self) -> bool {
        self.0
            .compare_exchange(RUNNING, STOP_REQUESTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// If the loop should keep presenting.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst) == RUNNING
    }

    /// If a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst) == STOP_REQUESTED
    }
}

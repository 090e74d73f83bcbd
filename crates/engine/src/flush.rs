//! Flush notification
//!
//! Waiters are callbacks interested in the next quiescent point. They carry
//! no error: a flush means "a consistent on-disk state was reached", not
//! "the write you cared about succeeded".
//!
//! Draining swaps the queue out before anything runs, so a callback that
//! registers another waiter lands in the next drain, not the current one.
//!
//! Waiters run on the save task. A panicking waiter is caught and reported
//! so it cannot unwind through the scheduler and strand its state.

use std::any::Any;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// A waiter callback.
pub type FlushCallback = Box<dyn FnOnce() + Send + 'static>;

/// Ordered queue of flush waiters.
#[derive(Default)]
pub struct FlushNotifier {
    waiters: Vec<FlushCallback>,
}

impl FlushNotifier {
    /// Queue a waiter behind those already registered.
    pub fn register(&mut self, callback: FlushCallback) {
        self.waiters.push(callback);
    }

    /// Remove every queued waiter, preserving registration order.
    pub fn drain(&mut self) -> FlushBatch {
        FlushBatch(mem::take(&mut self.waiters))
    }

    /// Number of queued waiters.
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// True if nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

impl fmt::Debug for FlushNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushNotifier")
            .field("waiters", &self.len())
            .finish()
    }
}

/// Waiters removed from the queue, ready to be invoked outside any lock.
#[must_use = "drained waiters are lost unless notified"]
pub struct FlushBatch(Vec<FlushCallback>);

impl FlushBatch {
    /// A batch with no waiters.
    pub fn empty() -> Self {
        FlushBatch(Vec::new())
    }

    /// A batch holding one waiter.
    pub fn single(callback: FlushCallback) -> Self {
        FlushBatch(vec![callback])
    }

    /// Invoke every waiter in registration order.
    ///
    /// A panic in one waiter does not stop the rest. Returns the panic
    /// message of every waiter that panicked.
    pub fn notify(self) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        debug!("Notifying {} flush waiters", self.len());

        let mut panics = Vec::new();
        for callback in self.0 {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
                let message = panic_message(payload.as_ref());
                warn!("Flush waiter panicked: {}", message);
                panics.push(message);
            }
        }
        panics
    }

    /// Number of waiters in the batch.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the batch holds no waiters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

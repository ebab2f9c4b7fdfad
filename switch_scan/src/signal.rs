//! Interrupt safe wake-up signals for tasks that consume switch changes.
//!
//! A [Signal] holds a word of pending bits. The scanner ORs a switch's bits in
//! from interrupt context and calls the signal's waker, which should only
//! *request* that the consuming task runs (e.g. spawn or pend it) so the
//! task itself runs after the interrupt returns. Several raises before the
//! consumer runs merge into one wake-up, so the bits say "something changed",
//! never "how many times". Consumers read the debounced values afterwards.

use core::convert::Infallible;
use core::sync::atomic::{AtomicU32, Ordering};

/// A lock free, single consumer wake-up signal
pub struct Signal {
    pending: AtomicU32,
    waker: Option<fn()>,
}

impl Signal {
    /// Creates a signal without a waker. The consumer has to poll it.
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
            waker: None,
        }
    }

    /// Creates a signal that calls `waker` every time it is raised
    pub const fn with_waker(waker: fn()) -> Self {
        Self {
            pending: AtomicU32::new(0),
            waker: Some(waker),
        }
    }

    /// Merges `bits` into the pending word and wakes the consumer
    pub fn raise(&self, bits: u32) {
        self.pending.fetch_or(bits, Ordering::Release);

        if let Some(wake) = self.waker {
            wake();
        }
    }

    /// Returns the pending bits without clearing them
    pub fn peek(&self) -> u32 {
        self.pending.load(Ordering::Acquire)
    }

    /// Clears and returns the pending bits, zero if nothing was raised
    pub fn take(&self) -> u32 {
        self.pending.swap(0, Ordering::Acquire)
    }

    /// Non-blocking wait: the accumulated bits once something was raised.
    /// Use `nb::block!(signal.wait())` to spin until then.
    pub fn wait(&self) -> nb::Result<u32, Infallible> {
        match self.take() {
            0 => Err(nb::Error::WouldBlock),
            bits => Ok(bits),
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

/// Where and how to notify the owner of a switch
#[derive(Clone, Copy)]
pub struct Notify<'a> {
    /// The consumer's signal
    pub signal: &'a Signal,

    /// The bits to raise on the signal
    pub bits: u32,
}

impl<'a> Notify<'a> {
    /// Raises this notification
    #[inline]
    pub fn send(&self) {
        self.signal.raise(self.bits);
    }
}

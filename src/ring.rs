use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::ConfigError;

/// What a full [`RingBuffer`] does with a new element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Keep what is stored, discard the incoming element.
    DropIncoming,
    /// Discard the oldest unread element to make room.
    EvictOldest,
}

/// Backing store guarded by the buffer's mutex.
///
/// `len` disambiguates full from empty, so all `capacity` slots are usable.
#[derive(Debug)]
struct Slots<T> {
    buf: Vec<Option<T>>,
    put: usize,
    get: usize,
    len: usize,
}

impl<T> Slots<T> {
    fn with_capacity(capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity);
        buf.resize_with(capacity, || None);
        Self {
            buf,
            put: 0,
            get: 0,
            len: 0,
        }
    }

    fn advance(&self, index: usize) -> usize {
        if index + 1 == self.buf.len() {
            0
        } else {
            index + 1
        }
    }

    fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    fn store(&mut self, value: T) {
        let put = self.put;
        self.buf[put] = Some(value);
        self.put = self.advance(put);
        self.len += 1;
    }

    /// Removes the oldest element, leaving its slot empty.
    fn take(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let get = self.get;
        let value = self.buf[get].take();
        self.get = self.advance(get);
        self.len -= 1;
        value
    }

    fn reset(&mut self) {
        self.buf.iter_mut().for_each(|slot| *slot = None);
        self.put = 0;
        self.get = 0;
        self.len = 0;
    }
}

/// Fixed-capacity FIFO shared between one producer and one consumer thread.
///
/// `push` never blocks; `pop` blocks up to a caller-supplied timeout. Both
/// take the same mutex, and a condition variable wakes a blocked `pop` as
/// soon as an element is stored.
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Mutex<Slots<T>>,
    available: Condvar,
    overflow: Overflow,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` elements.
    pub fn new(capacity: usize, overflow: Overflow) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                buffer: "ring buffer",
            });
        }
        Ok(Self {
            slots: Mutex::new(Slots::with_capacity(capacity)),
            available: Condvar::new(),
            overflow,
        })
    }

    pub fn capacity(&self) -> usize {
        self.lock().buf.len()
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Stores `value`, applying the overflow policy if the buffer is full.
    ///
    /// Returns `false` only when the value itself was discarded
    /// ([`Overflow::DropIncoming`] on a full buffer). Eviction of an older
    /// element still counts as stored.
    pub fn push(&self, value: T) -> bool {
        let mut slots = self.lock();
        if slots.is_full() {
            match self.overflow {
                Overflow::DropIncoming => return false,
                Overflow::EvictOldest => {
                    slots.take();
                }
            }
        }
        slots.store(value);
        drop(slots);
        self.available.notify_all();
        true
    }

    /// Takes the oldest element, waiting up to `timeout` for one to arrive.
    ///
    /// A zero timeout never blocks. A poisoned lock during the wait is
    /// reported as a timeout.
    pub fn pop(&self, timeout: Duration) -> Option<T> {
        let mut slots = self.lock();
        if slots.len == 0 {
            if timeout.is_zero() {
                return None;
            }
            slots = match self
                .available
                .wait_timeout_while(slots, timeout, |s| s.len == 0)
            {
                Ok((guard, _)) => guard,
                Err(_) => {
                    log::warn!("ring buffer wait interrupted, treating as timeout");
                    return None;
                }
            };
        }
        slots.take()
    }

    /// Snapshot only; may be stale by the time the caller acts on it.
    pub fn is_empty(&self) -> bool {
        self.lock().len == 0
    }

    pub fn len(&self) -> usize {
        self.lock().len
    }

    /// Drops every stored element. Waiters are not woken.
    pub fn clear(&self) {
        self.lock().reset();
    }

    fn lock(&self) -> MutexGuard<'_, Slots<T>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

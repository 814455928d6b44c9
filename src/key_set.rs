use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::ConfigError;

/// Bounded set of held key codes.
///
/// Members live in a slot array. Removing the last occupied slot shrinks the
/// array (along with any released slots before it); removing any other member
/// only releases its slot, which the next `add` reuses. `get_any` always
/// answers with the member in the highest occupied slot, which is the most
/// recently appended one unless a released slot was reused since.
#[derive(Debug)]
pub struct KeySet {
    slots: Mutex<Vec<Option<u32>>>,
    capacity: usize,
    added: Condvar,
}

impl KeySet {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity { buffer: "key set" });
        }
        Ok(Self {
            slots: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            added: Condvar::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts `code`. Returns `false` only when the set is full and `code`
    /// is not already a member.
    pub fn add(&self, code: u32) -> bool {
        let mut slots = self.lock();
        if slots.contains(&Some(code)) {
            return true;
        }
        if let Some(released) = slots.iter_mut().find(|slot| slot.is_none()) {
            *released = Some(code);
        } else if slots.len() < self.capacity {
            slots.push(Some(code));
        } else {
            return false;
        }
        drop(slots);
        self.added.notify_all();
        true
    }

    /// Removes `code`, returning whether it was a member.
    pub fn remove(&self, code: u32) -> bool {
        let mut slots = self.lock();
        match slots.iter().position(|slot| *slot == Some(code)) {
            Some(index) if index + 1 == slots.len() => {
                slots.pop();
                while slots.last() == Some(&None) {
                    slots.pop();
                }
                true
            }
            Some(index) => {
                slots[index] = None;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, code: u32) -> bool {
        self.lock().contains(&Some(code))
    }

    /// The highest slot is always occupied, so an empty slot array is the
    /// only empty state.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().iter().flatten().count()
    }

    /// Returns a member, waiting up to `timeout` for one to be added.
    ///
    /// A zero timeout never blocks. A poisoned lock during the wait is
    /// reported as a timeout.
    pub fn get_any(&self, timeout: Duration) -> Option<u32> {
        let mut slots = self.lock();
        if slots.is_empty() {
            if timeout.is_zero() {
                return None;
            }
            slots = match self
                .added
                .wait_timeout_while(slots, timeout, |s| s.is_empty())
            {
                Ok((guard, _)) => guard,
                Err(_) => {
                    log::warn!("key set wait interrupted, treating as timeout");
                    return None;
                }
            };
        }
        slots.last().copied().flatten()
    }

    /// Forgets every member. Waiters are not woken.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Option<u32>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

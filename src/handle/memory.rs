//! Process-local named locks.
//!
//! A [`MemoryNamespace`] plays the role of the machine-wide lock namespace
//! inside a single process: every [`MemoryLock`] opened from the same
//! namespace with the same name contends for the same slot. Dropping or
//! disposing a held handle abandons the slot, the way a process exiting
//! abandons a file lock.

use super::{AcquireOutcome, NamedLock, deadline};
use crate::GlobalMutex;
use crate::error::{GlobalMutexError, Result};
use crate::name::LockName;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct SlotState {
    held: bool,
    abandoned: bool,
}

#[derive(Debug, Default)]
struct Slot {
    state: Mutex<SlotState>,
    available: Condvar,
}

/// A set of process-local named locks.
///
/// Cloning yields a handle to the same namespace.
#[derive(Debug, Clone, Default)]
pub struct MemoryNamespace {
    slots: Arc<Mutex<HashMap<String, Arc<Slot>>>>,
}

impl MemoryNamespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a handle on the slot for `name`. Never blocks.
    pub fn open(&self, name: &LockName) -> MemoryLock {
        let slot = self
            .slots
            .lock()
            .entry(name.namespaced())
            .or_default()
            .clone();

        MemoryLock {
            name: name.clone(),
            slot: Some(slot),
            held: false,
        }
    }

    /// Construct a [`GlobalMutex`] over a fresh handle from this namespace.
    pub fn mutex(&self, name: &str) -> Result<GlobalMutex<MemoryLock>> {
        let name = LockName::new(name)?;
        let handle = self.open(&name);
        Ok(GlobalMutex::from_handle(name, handle))
    }

    /// Whether any handle currently holds `name`.
    pub fn is_locked(&self, name: &str) -> bool {
        let Ok(name) = LockName::new(name) else {
            return false;
        };
        self.slots
            .lock()
            .get(&name.namespaced())
            .is_some_and(|slot| slot.state.lock().held)
    }
}

/// A handle on one slot of a [`MemoryNamespace`].
#[derive(Debug)]
pub struct MemoryLock {
    name: LockName,
    /// `None` once disposed.
    slot: Option<Arc<Slot>>,
    held: bool,
}

impl MemoryLock {
    /// The lock name.
    pub fn name(&self) -> &LockName {
        &self.name
    }
}

impl NamedLock for MemoryLock {
    fn wait(&mut self, timeout: Duration) -> Result<AcquireOutcome> {
        if self.held {
            return Err(GlobalMutexError::Usage(format!(
                "lock '{}' is already held by this handle",
                self.name
            )));
        }

        let slot = self.slot.as_ref().ok_or_else(|| {
            GlobalMutexError::Usage(format!("lock handle '{}' has been disposed", self.name))
        })?;

        let deadline = deadline(timeout);
        let mut state = slot.state.lock();
        while state.held {
            match deadline {
                None => slot.available.wait(&mut state),
                Some(deadline) => {
                    if slot.available.wait_until(&mut state, deadline).timed_out() && state.held {
                        return Ok(AcquireOutcome::TimedOut);
                    }
                }
            }
        }

        state.held = true;
        let abandoned = std::mem::take(&mut state.abandoned);
        drop(state);
        self.held = true;

        Ok(if abandoned {
            AcquireOutcome::Abandoned
        } else {
            AcquireOutcome::Acquired
        })
    }

    fn release(&mut self) -> Result<()> {
        let slot = match &self.slot {
            Some(slot) if self.held => slot,
            _ => {
                return Err(GlobalMutexError::Usage(format!(
                    "release of lock '{}' which this handle does not hold",
                    self.name
                )));
            }
        };

        slot.state.lock().held = false;
        slot.available.notify_one();
        self.held = false;
        Ok(())
    }

    fn dispose(&mut self) {
        if let Some(slot) = self.slot.take()
            && self.held
        {
            let mut state = slot.state.lock();
            state.held = false;
            state.abandoned = true;
            drop(state);
            slot.available.notify_one();
        }
        self.held = false;
    }

    fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for MemoryLock {
    fn drop(&mut self) {
        self.dispose();
    }
}

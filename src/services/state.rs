use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{AppError, AppResult};

/// Handle taken before an async read; the result only applies if no newer
/// local write happened in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    revision: u64,
}

impl LoadTicket {
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// In-memory collection with a revision counter and a liveness flag.
///
/// Every write bumps the revision. `finish_load` refuses a response whose
/// ticket predates the latest write, or that arrives after `close`.
#[derive(Debug)]
pub struct VersionedState<T> {
    value: RwLock<T>,
    revision: AtomicU64,
    alive: AtomicBool,
    name: &'static str,
}

impl<T: Clone> VersionedState<T> {
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            value: RwLock::new(value),
            revision: AtomicU64::new(0),
            alive: AtomicBool::new(true),
            name,
        }
    }

    pub fn snapshot(&self) -> AppResult<T> {
        self.value
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| AppError::other(format!("{} state lock poisoned", self.name)))
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Marks the owner as gone; later loads are discarded.
    pub fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Runs `f` on the current value; a `Some` result replaces it.
    ///
    /// Returns the new value when a replacement happened.
    pub fn update<F>(&self, f: F) -> AppResult<Option<T>>
    where
        F: FnOnce(&T) -> Option<T>,
    {
        let mut guard = self
            .value
            .write()
            .map_err(|_| AppError::other(format!("{} state lock poisoned", self.name)))?;

        match f(&guard) {
            Some(next) => {
                *guard = next.clone();
                self.revision.fetch_add(1, Ordering::SeqCst);
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    /// Mutates in place. Callers use this only for patches they can undo.
    pub fn modify<F, R>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut guard = self
            .value
            .write()
            .map_err(|_| AppError::other(format!("{} state lock poisoned", self.name)))?;
        let result = f(&mut guard);
        self.revision.fetch_add(1, Ordering::SeqCst);
        Ok(result)
    }

    pub fn replace(&self, value: T) -> AppResult<()> {
        self.update(move |_| Some(value)).map(|_| ())
    }

    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket {
            revision: self.revision(),
        }
    }

    /// Applies a loaded value unless it is stale or the owner closed.
    pub fn finish_load(&self, ticket: LoadTicket, value: T) -> AppResult<bool> {
        if !self.is_alive() {
            debug!(target: "app::state", state = self.name, "discarding load after close");
            return Ok(false);
        }

        let mut guard = self
            .value
            .write()
            .map_err(|_| AppError::other(format!("{} state lock poisoned", self.name)))?;

        if self.revision() != ticket.revision {
            debug!(
                target: "app::state",
                state = self.name,
                ticket = ticket.revision,
                current = self.revision(),
                "discarding stale load"
            );
            return Ok(false);
        }

        *guard = value;
        self.revision.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{Mutex, PoisonError},
};

use tracing::debug;

use crate::error::{Error, Result};

/// Registry of live channel-to-session bindings.
///
/// All operations take a shared reference; the inner map is guarded by a
/// synchronous mutex that is never held across an `.await` point. Bind
/// checks and inserts happen under a single lock acquisition, so two
/// concurrent `start` commands for the same channel cannot both succeed.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    bindings: Mutex<HashMap<u64, String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `channel_id` to `session_id` unless a binding already exists.
    pub fn bind_if_absent(&self, channel_id: u64, session_id: impl Into<String>) -> Result<()> {
        let mut bindings = self.lock();
        match bindings.entry(channel_id) {
            Entry::Occupied(entry) => Err(Error::SessionAlreadyActive {
                channel_id,
                session_id: entry.get().clone(),
            }),
            Entry::Vacant(entry) => {
                let session_id = session_id.into();
                debug!(channel_id, %session_id, "bound channel to session");
                entry.insert(session_id);
                Ok(())
            },
        }
    }

    /// Session bound to `channel_id`, if any.
    pub fn lookup(&self, channel_id: u64) -> Option<String> {
        self.lock().get(&channel_id).cloned()
    }

    /// Remove the binding for `channel_id`, returning the session it held.
    pub fn unbind(&self, channel_id: u64) -> Option<String> {
        let removed = self.lock().remove(&channel_id);
        if let Some(ref session_id) = removed {
            debug!(channel_id, %session_id, "unbound channel");
        }
        removed
    }

    /// Snapshot of all live bindings. Iteration order is unspecified.
    pub fn all(&self) -> Vec<(u64, String)> {
        self.lock()
            .iter()
            .map(|(channel, session)| (*channel, session.clone()))
            .collect()
    }

    /// Remove and return every binding (shutdown cleanup).
    pub fn drain(&self) -> Vec<(u64, String)> {
        self.lock().drain().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, String>> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

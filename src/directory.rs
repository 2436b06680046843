//! In-memory directory of connected viewers and their privileges.
//!
//! DESIGN
//! ======
//! Backed by plain maps behind a `Mutex`, the same way the rate limiter
//! keeps its per-client windows. Ranks are keyed by identity rather than
//! by connection, so a viewer who reconnects keeps their room rank and a
//! viewer who renames to a different identity does not inherit it.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::identity::{Directory, Rank, RoomId, UserId, Viewer};

#[derive(Default)]
struct DirectoryInner {
    connected: HashMap<UserId, Viewer>,
    ranks: HashMap<RoomId, HashMap<UserId, Rank>>,
    elevated: HashSet<UserId>,
}

#[derive(Default)]
pub struct MemoryDirectory {
    inner: Mutex<DirectoryInner>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a viewer reachable. Replaces any viewer with the same identity.
    pub fn connect(&self, viewer: Viewer) {
        info!(user_id = %viewer.id, name = %viewer.name, "directory: viewer connected");
        self.lock().connected.insert(viewer.id.clone(), viewer);
    }

    /// Mark a viewer reachable unless their identity is already connected.
    /// Check and insert happen under one lock, so two sessions can never
    /// both claim the same identity.
    pub fn try_connect(&self, viewer: Viewer) -> bool {
        let mut inner = self.lock();
        if inner.connected.contains_key(&viewer.id) {
            return false;
        }
        info!(user_id = %viewer.id, name = %viewer.name, "directory: viewer connected");
        inner.connected.insert(viewer.id.clone(), viewer);
        true
    }

    pub fn disconnect(&self, id: &UserId) {
        if self.lock().connected.remove(id).is_some() {
            info!(user_id = %id, "directory: viewer disconnected");
        }
    }

    /// Rename a connected viewer. Returns the renamed viewer, or `None` if
    /// `old` is not connected, the new name normalizes to an empty id, or
    /// another connected viewer already holds the new id.
    pub fn rename(&self, old: &UserId, new_name: &str) -> Option<Viewer> {
        let viewer = Viewer::new(new_name);
        if viewer.id.is_empty() {
            return None;
        }
        let mut inner = self.lock();
        if viewer.id != *old && inner.connected.contains_key(&viewer.id) {
            return None;
        }
        inner.connected.remove(old)?;
        inner.connected.insert(viewer.id.clone(), viewer.clone());
        info!(old = %old, new = %viewer.id, name = %viewer.name, "directory: viewer renamed");
        Some(viewer)
    }

    pub fn set_rank(&self, room: &RoomId, id: &UserId, rank: Rank) {
        self.lock()
            .ranks
            .entry(room.clone())
            .or_default()
            .insert(id.clone(), rank);
    }

    pub fn set_elevated(&self, id: &UserId, elevated: bool) {
        let mut inner = self.lock();
        if elevated {
            inner.elevated.insert(id.clone());
        } else {
            inner.elevated.remove(id);
        }
    }
}

impl Directory for MemoryDirectory {
    fn resolve_viewer(&self, id: &UserId) -> Option<Viewer> {
        self.lock().connected.get(id).cloned()
    }

    fn has_minimum_rank(&self, room: &RoomId, viewer: &Viewer, rank: Rank) -> bool {
        let held = self
            .lock()
            .ranks
            .get(room)
            .and_then(|members| members.get(&viewer.id).copied())
            .unwrap_or_default();
        held >= rank
    }

    fn is_elevated(&self, viewer: &Viewer) -> bool {
        self.lock().elevated.contains(&viewer.id)
    }
}

#[cfg(test)]
#[path = "directory_test.rs"]
mod tests;

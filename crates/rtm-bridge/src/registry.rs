//! Handle registry: integer identity for live engine objects.
//!
//! Two kind-scoped tables (sessions, channels) with independent monotone
//! counters, both behind one mutex. Handles are never reused, so a stale
//! completion can never be misattributed to a newer object that happens
//! to occupy the same slot. The lock is only ever held for the map
//! operation itself, never across an engine call or a transport send.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use rtm_core::handle::Handle;
use rtm_engine::{RtmChannel, RtmSession};

/// One kind's handle table with its monotone allocation counter.
struct SlotTable<T> {
    entries: HashMap<Handle, T>,
    next: i64,
}

impl<T> SlotTable<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next: 0,
        }
    }

    fn allocate(&mut self, instance: T) -> Handle {
        let handle = Handle(self.next);
        self.next += 1;
        let _ = self.entries.insert(handle, instance);
        handle
    }

    fn release(&mut self, handle: Handle) -> bool {
        self.entries.remove(&handle).is_some()
    }
}

struct Tables {
    sessions: SlotTable<Arc<dyn RtmSession>>,
    channels: SlotTable<Arc<dyn RtmChannel>>,
}

/// Mapping from host-visible handles to live engine objects.
///
/// A handle present in the registry maps to exactly one live instance of
/// the correct kind; an absent handle makes every operation naming it
/// fail with the unknown-handle outcome instead of crashing or silently
/// doing nothing.
pub struct HandleRegistry {
    tables: Mutex<Tables>,
}

impl HandleRegistry {
    /// Create an empty registry; both counters start at 0.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables {
                sessions: SlotTable::new(),
                channels: SlotTable::new(),
            }),
        }
    }

    // ── Sessions ────────────────────────────────────────────────────

    /// Store a session under a freshly minted handle. Never fails.
    pub fn allocate_session(&self, instance: Arc<dyn RtmSession>) -> Handle {
        self.tables.lock().sessions.allocate(instance)
    }

    /// Look up a live session by handle.
    #[must_use]
    pub fn resolve_session(&self, handle: Handle) -> Option<Arc<dyn RtmSession>> {
        self.tables.lock().sessions.entries.get(&handle).cloned()
    }

    /// Find the handle currently bound to a live session instance.
    ///
    /// Completion callbacks carry the instance, not the handle; a `None`
    /// here means the object was released and the caller must suppress
    /// the event rather than deliver it with no addressee.
    #[must_use]
    pub fn reverse_resolve_session(&self, instance: &Arc<dyn RtmSession>) -> Option<Handle> {
        self.tables
            .lock()
            .sessions
            .entries
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, instance))
            .map(|(&handle, _)| handle)
    }

    /// Remove a session mapping. Idempotent: a second release of the
    /// same handle returns `false`, not an error.
    pub fn release_session(&self, handle: Handle) -> bool {
        self.tables.lock().sessions.release(handle)
    }

    // ── Channels ────────────────────────────────────────────────────

    /// Store a channel under a freshly minted handle. Never fails.
    ///
    /// The channel counter is independent of the session counter.
    pub fn allocate_channel(&self, instance: Arc<dyn RtmChannel>) -> Handle {
        self.tables.lock().channels.allocate(instance)
    }

    /// Look up a live channel by handle.
    #[must_use]
    pub fn resolve_channel(&self, handle: Handle) -> Option<Arc<dyn RtmChannel>> {
        self.tables.lock().channels.entries.get(&handle).cloned()
    }

    /// Find the handle currently bound to a live channel instance.
    #[must_use]
    pub fn reverse_resolve_channel(&self, instance: &Arc<dyn RtmChannel>) -> Option<Handle> {
        self.tables
            .lock()
            .channels
            .entries
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, instance))
            .map(|(&handle, _)| handle)
    }

    /// Remove a channel mapping. Idempotent.
    pub fn release_channel(&self, handle: Handle) -> bool {
        self.tables.lock().channels.release(handle)
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Marker service implementation
//!
//! Owns every marker table of a process and the weak registry used to
//! relocate them after a duplication event.

use crate::error::{Error, Result};
use crate::types::{MarkerMap, PositionToken, StreamId, LAST_MARKER};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Weak};
use tracing::{debug, warn};

/// Process-wide default service
static GLOBAL: LazyLock<MarkerService> = LazyLock::new(MarkerService::new);

/// Identity cell shared between a stream and the registry.
///
/// The registry only ever holds a `Weak` to this, so it never keeps a stream
/// alive.
#[derive(Debug)]
pub struct StreamHandle {
    id: Mutex<StreamId>,
}

impl StreamHandle {
    /// Current identity of the stream
    pub fn id(&self) -> StreamId {
        *self.id.lock()
    }
}

/// Tables and registry, keyed for the process `pid`
#[derive(Debug)]
struct Inner {
    pid: u32,
    next_serial: u64,
    tables: HashMap<StreamId, MarkerMap>,
    registry: HashMap<StreamId, Weak<StreamHandle>>,
}

impl Inner {
    fn new() -> Self {
        Self {
            pid: std::process::id(),
            next_serial: 0,
            tables: HashMap::new(),
            registry: HashMap::new(),
        }
    }

    /// Move every live stream to its identity in process `pid`.
    ///
    /// No-op when the tables are already keyed for `pid`.
    fn relocate(&mut self, pid: u32) {
        if self.pid == pid {
            return;
        }

        let previous = self.pid;
        let registry = std::mem::take(&mut self.registry);
        let mut tables = std::mem::take(&mut self.tables);
        let mut moved = 0usize;

        for (old_id, weak) in registry {
            let table = tables.remove(&old_id);
            let Some(handle) = weak.upgrade() else {
                warn!(stream = %old_id, "Pruned dead stream during relocation");
                continue;
            };

            let new_id = old_id.in_process(pid);
            let table = table.unwrap_or_else(|| {
                warn!(stream = %old_id, "Live stream had no marker table");
                MarkerMap::new()
            });
            self.tables.insert(new_id, table);
            self.registry.insert(new_id, weak);
            *handle.id.lock() = new_id;
            moved += 1;
        }

        if !tables.is_empty() {
            warn!(
                count = tables.len(),
                "Dropped marker tables with no registered stream"
            );
        }

        self.pid = pid;
        debug!(from = previous, to = pid, streams = moved, "Relocated marker tables");
    }

    fn prune_dead(&mut self) {
        let dead: Vec<StreamId> = self
            .registry
            .iter()
            .filter(|(_, weak)| weak.strong_count() == 0)
            .map(|(id, _)| *id)
            .collect();

        for id in dead {
            warn!(stream = %id, "Pruned dead stream from registry");
            self.registry.remove(&id);
            self.tables.remove(&id);
        }
    }
}

/// Which side of a duplication the caller is on
#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkOutcome {
    /// The original process; `child` is the new process id
    Parent { child: i32 },
    /// The duplicate
    Child,
}

/// Marker tables and the duplication registry for a set of streams.
///
/// Cloning yields another handle onto the same tables. Independent instances
/// share nothing, which is what tests use; applications that do not want to
/// pass a service around can use [`MarkerService::global`].
#[derive(Debug, Clone)]
pub struct MarkerService {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MarkerService {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerService {
    /// Create an empty service
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
        }
    }

    /// The lazily created process-wide service
    pub fn global() -> &'static MarkerService {
        &GLOBAL
    }

    /// Lock the tables, relocating first if this is a duplicated process
    fn lock(&self) -> MutexGuard<'_, Inner> {
        let mut inner = self.inner.lock();
        inner.relocate(std::process::id());
        inner
    }

    // ========================================================================
    // Stream lifecycle
    // ========================================================================

    /// Register a newly opened stream, seeding `LAST` with its initial position
    pub(crate) fn register(&self, initial: PositionToken) -> Arc<StreamHandle> {
        let mut inner = self.lock();
        let id = StreamId::new(inner.pid, inner.next_serial);
        inner.next_serial += 1;

        let handle = Arc::new(StreamHandle {
            id: Mutex::new(id),
        });

        let mut table = MarkerMap::new();
        table.insert(LAST_MARKER.to_string(), initial);
        inner.tables.insert(id, table);
        inner.registry.insert(id, Arc::downgrade(&handle));

        debug!(stream = %id, "Registered stream");
        handle
    }

    /// Drop the table and registry entry of a disposed stream
    pub(crate) fn release(&self, handle: &StreamHandle) {
        let mut inner = self.lock();
        let id = handle.id();
        let had_table = inner.tables.remove(&id).is_some();
        let had_entry = inner.registry.remove(&id).is_some();

        if had_table || had_entry {
            debug!(stream = %id, "Released stream");
        }
    }

    /// Run `f` against the marker table of `handle`
    pub(crate) fn with_table<R>(
        &self,
        handle: &StreamHandle,
        f: impl FnOnce(&mut MarkerMap) -> R,
    ) -> Result<R> {
        let mut inner = self.lock();
        let id = handle.id();
        let table = inner.tables.get_mut(&id).ok_or(Error::ClosedHandle)?;
        Ok(f(table))
    }

    // ========================================================================
    // Duplication
    // ========================================================================

    /// Relocate every live stream to its identity in the current process.
    ///
    /// Call this in every process resulting from a duplication, before any
    /// marker operation. Calling it again in the same process does nothing.
    /// Marker operations also run it on their own when they notice the
    /// process id changed.
    pub fn after_duplication(&self) {
        self.inner.lock().relocate(std::process::id());
    }

    /// Relocate as if the current process id were `pid`
    #[cfg(test)]
    pub(crate) fn relocate_to(&self, pid: u32) {
        self.inner.lock().relocate(pid);
    }

    /// Duplicate the process and relocate marker tables on both sides.
    ///
    /// The underlying file descriptions stay shared with the other process;
    /// coordinating reads and seeks across the two copies is up to the caller.
    /// No other thread may be holding this service's lock or be allocating
    /// when it is called; the child relocates under that lock before returning.
    #[cfg(unix)]
    pub fn fork(&self) -> Result<ForkOutcome> {
        // SAFETY: in a multithreaded process the child may only rely on state
        // no other thread held at the fork. Callers guarantee no other thread
        // holds this service's lock or is inside the allocator, since
        // after_duplication locks and allocates in the child.
        let pid = unsafe { libc::fork() };
        match pid {
            -1 => Err(std::io::Error::last_os_error().into()),
            0 => {
                self.after_duplication();
                Ok(ForkOutcome::Child)
            }
            child => {
                self.after_duplication();
                Ok(ForkOutcome::Parent { child })
            }
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Identities of all live streams, pruning dead registry entries
    pub fn live_streams(&self) -> Vec<StreamId> {
        let mut inner = self.lock();
        inner.prune_dead();
        let mut ids: Vec<StreamId> = inner.registry.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of registered streams, including dead ones not yet pruned
    pub fn stream_count(&self) -> usize {
        self.lock().registry.len()
    }

    /// Number of marker tables
    pub fn table_len(&self) -> usize {
        self.lock().tables.len()
    }

    /// Whether a marker table exists for `id`
    pub fn has_table(&self, id: StreamId) -> bool {
        self.lock().tables.contains_key(&id)
    }

    /// Whether `id` has a registry entry
    pub fn is_registered(&self, id: StreamId) -> bool {
        self.lock().registry.contains_key(&id)
    }
}

//! Registry of releasable binary handles.
//!
//! Every source image and every produced artifact is registered here and
//! referred to by an opaque [`Handle`]. A handle stays valid until it is
//! released, and each handle has exactly one release point: the session's
//! `clear_all`. Handle numbers are never reused, so a stale handle can never
//! resolve to someone else's bytes.
//!
//! Bytes are stored as `Arc<[u8]>`. Resolving a handle hands out a shared,
//! read-only view without copying the payload, which lets the pipeline read a
//! source while registering the artifact produced from it.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque reference to a registered binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Handle(u64);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    last: u64,
    live: HashMap<Handle, Arc<[u8]>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `bytes` and issue a fresh handle for them.
    pub fn register(&mut self, bytes: impl Into<Arc<[u8]>>) -> Handle {
        self.last += 1;
        let handle = Handle(self.last);
        self.live.insert(handle, bytes.into());
        handle
    }

    /// Shared view of the bytes behind `handle`, if it is still live.
    pub fn resolve(&self, handle: Handle) -> Option<Arc<[u8]>> {
        self.live.get(&handle).cloned()
    }

    pub fn len_of(&self, handle: Handle) -> Option<usize> {
        self.live.get(&handle).map(|bytes| bytes.len())
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Release `handle`. Returns false if it was already released.
    pub fn release(&mut self, handle: Handle) -> bool {
        self.live.remove(&handle).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total bytes held by live handles.
    pub fn live_bytes(&self) -> usize {
        self.live.values().map(|bytes| bytes.len()).sum()
    }
}

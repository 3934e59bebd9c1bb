//! Poll-based load-state handles.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::kind::AssetKind;
use crate::path::SourcePath;

/// Load state of an asset, observed by polling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum LoadState {
    Loading = 0,
    Ready = 1,
    Failed = 2,
}

impl LoadState {
    fn from_u32(value: u32) -> Self {
        match value {
            0 => LoadState::Loading,
            1 => LoadState::Ready,
            _ => LoadState::Failed,
        }
    }
}

struct HandleData {
    path: SourcePath,
    kind: AssetKind,
    state: AtomicU32,
}

/// Shared handle to an asset load issued through an
/// [`AssetSource`](crate::source::AssetSource).
///
/// Cheap to clone; all clones observe the same state. The tile pipelines
/// never block on a handle, they poll it once per scheduling tick.
#[derive(Clone)]
pub struct AssetHandle {
    data: Arc<HandleData>,
}

impl AssetHandle {
    /// Create a handle in the `Loading` state.
    pub fn new(path: SourcePath, kind: AssetKind) -> Self {
        Self {
            data: Arc::new(HandleData {
                path,
                kind,
                state: AtomicU32::new(LoadState::Loading as u32),
            }),
        }
    }

    pub fn path(&self) -> &SourcePath {
        &self.data.path
    }

    pub fn kind(&self) -> AssetKind {
        self.data.kind
    }

    pub fn state(&self) -> LoadState {
        LoadState::from_u32(self.data.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LoadState::Ready
    }

    pub fn is_failed(&self) -> bool {
        self.state() == LoadState::Failed
    }

    /// Publish a successful load. Called by the asset source.
    pub fn mark_ready(&self) {
        self.data
            .state
            .store(LoadState::Ready as u32, Ordering::Release);
    }

    /// Publish a failed load. Called by the asset source.
    pub fn mark_failed(&self) {
        self.data
            .state
            .store(LoadState::Failed as u32, Ordering::Release);
    }

    /// True if both handles observe the same underlying load.
    pub fn same_load(&self, other: &AssetHandle) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("path", &self.data.path.as_str())
            .field("kind", &self.data.kind)
            .field("state", &self.state())
            .finish()
    }
}

//! The asset-source seam between the tile pipelines and the host engine.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::bounds::Aabb;
use crate::handle::{AssetHandle, LoadState};
use crate::kind::AssetKind;
use crate::path::SourcePath;

/// Host-side asset access as the tile pipelines see it.
///
/// `request_load` must be idempotent per path: asking again for a path that
/// is already loading or loaded joins the same load and returns a handle
/// observing the same state. Neither method may block; both are called from
/// per-frame scheduling code.
pub trait AssetSource: Send + Sync {
    /// Begin (or join) an asynchronous load of `path`.
    fn request_load(&self, path: &SourcePath, kind: AssetKind) -> AssetHandle;

    /// Bounding box of a loaded 3-D asset. `None` while loading, after a
    /// failure, or for assets without geometry.
    fn bounds(&self, handle: &AssetHandle) -> Option<Aabb>;
}

struct RegistryEntry {
    handle: AssetHandle,
    bounds: Option<Aabb>,
}

/// Table-driven [`AssetSource`] for hosts and tests.
///
/// Loads stay `Loading` until the host publishes an outcome with
/// [`resolve`](AssetRegistry::resolve) or [`fail`](AssetRegistry::fail).
/// Safe to share as `Arc<AssetRegistry>` across the editor.
#[derive(Default)]
pub struct AssetRegistry {
    entries: RwLock<BTreeMap<SourcePath, RegistryEntry>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as loaded and record the bounds reported for it.
    ///
    /// Resolving a path nobody asked for yet pre-registers it; a later
    /// `request_load` then observes `Ready` immediately.
    pub fn resolve(&self, path: &SourcePath, bounds: Aabb) {
        let mut entries = self.entries.write();
        match entries.get_mut(path) {
            Some(entry) => {
                entry.bounds = Some(bounds);
                entry.handle.mark_ready();
            }
            None => {
                let handle = AssetHandle::new(path.clone(), AssetKind::from_path(path));
                handle.mark_ready();
                entries.insert(
                    path.clone(),
                    RegistryEntry {
                        handle,
                        bounds: Some(bounds),
                    },
                );
            }
        }
    }

    /// Mark `path` as failed.
    pub fn fail(&self, path: &SourcePath) {
        let mut entries = self.entries.write();
        match entries.get_mut(path) {
            Some(entry) => entry.handle.mark_failed(),
            None => {
                log::warn!("failing asset that was never requested: {path}");
                let handle = AssetHandle::new(path.clone(), AssetKind::from_path(path));
                handle.mark_failed();
                entries.insert(
                    path.clone(),
                    RegistryEntry {
                        handle,
                        bounds: None,
                    },
                );
            }
        }
    }

    /// Number of loads issued and not yet resolved or failed.
    pub fn pending(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.handle.state() == LoadState::Loading)
            .count()
    }
}

impl AssetSource for AssetRegistry {
    fn request_load(&self, path: &SourcePath, kind: AssetKind) -> AssetHandle {
        let mut entries = self.entries.write();
        entries
            .entry(path.clone())
            .or_insert_with(|| RegistryEntry {
                handle: AssetHandle::new(path.clone(), kind),
                bounds: None,
            })
            .handle
            .clone()
    }

    fn bounds(&self, handle: &AssetHandle) -> Option<Aabb> {
        self.entries
            .read()
            .get(handle.path())
            .and_then(|entry| entry.bounds)
    }
}

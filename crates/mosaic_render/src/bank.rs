//! Registered content the offscreen scene can instance.
//!
//! The bank maps source paths to drawable content. Models map straight to a
//! mesh; prefabs map to the path of the model they contain, which may still
//! be streaming in when the prefab itself is ready.

use std::collections::HashMap;

use mosaic_asset::{Aabb, AssetKind, SourcePath};

enum Slot<M> {
    Mesh { mesh: M, bounds: Aabb },
    Prefab { content: SourcePath },
    Failed,
}

/// What a content path resolves to right now.
pub enum Resolution<'a, M> {
    /// Nothing registered under the path yet.
    Absent,
    /// Drawable mesh with its bounds.
    Ready { mesh: &'a M, bounds: Aabb },
    /// The path can never become drawable.
    Failed,
}

/// Content registry keyed by source path.
///
/// Generic over the mesh type so the bookkeeping can be exercised without a
/// GPU device.
pub struct ContentBank<M> {
    slots: HashMap<SourcePath, Slot<M>>,
}

impl<M> Default for ContentBank<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ContentBank<M> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Register a drawable mesh under `path`, replacing any earlier slot.
    pub fn insert_mesh(&mut self, path: SourcePath, mesh: M, bounds: Aabb) {
        self.slots.insert(path, Slot::Mesh { mesh, bounds });
    }

    /// Register a prefab whose drawable content lives at `content`.
    pub fn insert_prefab(&mut self, path: SourcePath, content: SourcePath) {
        self.slots.insert(path, Slot::Prefab { content });
    }

    /// Mark `path` as permanently undrawable.
    pub fn mark_failed(&mut self, path: SourcePath) {
        self.slots.insert(path, Slot::Failed);
    }

    pub fn contains(&self, path: &SourcePath) -> bool {
        self.slots.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The content path an asset of `kind` at `path` would draw, if it can
    /// be instanced at all. Models draw themselves; prefabs draw the model
    /// they reference.
    pub fn content_for(&self, path: &SourcePath, kind: AssetKind) -> Option<SourcePath> {
        match (kind, self.slots.get(path)) {
            (AssetKind::Model, Some(Slot::Mesh { .. })) => Some(path.clone()),
            (AssetKind::Prefab, Some(Slot::Prefab { content })) => Some(content.clone()),
            _ => None,
        }
    }

    /// Resolve a content path to its mesh. A prefab slot here means a prefab
    /// pointing at another prefab, which is not followed.
    pub fn resolve(&self, content: &SourcePath) -> Resolution<'_, M> {
        match self.slots.get(content) {
            None => Resolution::Absent,
            Some(Slot::Mesh { mesh, bounds }) => Resolution::Ready {
                mesh,
                bounds: *bounds,
            },
            Some(Slot::Prefab { .. }) | Some(Slot::Failed) => Resolution::Failed,
        }
    }
}

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Canonicalising store for descriptor sets.

Sets that compare equal collapse to one shared instance with a reference count.
The cache listens to every texture its sets reference and empties the
[`RsData`] of affected sets when a texture changes in a way that makes its
views stale.
*/

use std::any::Any;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Weak};

use super::rs_data::RsData;
use crate::error::Error;
use crate::textures::{TextureChangeReason, TextureGpu, TextureGpuListener, TextureId};

/// A binding set that can be stored in a [`DescriptorSetCache`].
pub trait DescriptorSet: Ord + Send + Sync + 'static {
    fn check_validity(&self) -> Result<(), Error>;
    /// Every texture the set binds, in slot order. May repeat.
    fn referenced_textures(&self) -> Vec<Arc<TextureGpu>>;
    fn rs_data(&self) -> &RsData;
}

struct Watch {
    texture: Weak<TextureGpu>,
    sets: usize,
}

struct CacheInner<T> {
    sets: Mutex<BTreeMap<Arc<T>, u16>>,
    watched: Mutex<HashMap<TextureId, Watch>>,
}

struct CacheListener<T> {
    inner: Weak<CacheInner<T>>,
}

impl<T: DescriptorSet> TextureGpuListener for CacheListener<T> {
    fn notify_texture_changed(&self, texture: &TextureGpu, reason: TextureChangeReason, _extra_data: Option<&dyn Any>) {
        if !reason.invalidates_views() {
            return;
        }
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let sets = inner.sets.lock().expect("Failed to lock descriptor sets");
        let mut invalidated = 0usize;
        for set in sets.keys() {
            if set.referenced_textures().iter().any(|t| t.id() == texture.id()) && set.rs_data().invalidate() {
                invalidated += 1;
            }
        }
        if invalidated > 0 {
            logwise::trace_sync!(
                "Invalidated {count} descriptor sets after {reason} on {name}",
                count = invalidated,
                reason = logwise::privacy::LogIt(&reason),
                name = logwise::privacy::LogIt(texture.name())
            );
        }
    }
}

/// Shared, reference-counted descriptor sets of one kind.
pub struct DescriptorSetCache<T: DescriptorSet> {
    inner: Arc<CacheInner<T>>,
    listener: Arc<dyn TextureGpuListener>,
}

impl<T: DescriptorSet> DescriptorSetCache<T> {
    pub fn new() -> Self {
        let inner = Arc::new(CacheInner {
            sets: Mutex::new(BTreeMap::new()),
            watched: Mutex::new(HashMap::new()),
        });
        let listener: Arc<dyn TextureGpuListener> = Arc::new(CacheListener {
            inner: Arc::downgrade(&inner),
        });
        DescriptorSetCache { inner, listener }
    }

    /// Returns the shared instance equal to `set`, creating it when needed.
    ///
    /// `set` is validated first; an invalid set is never stored.
    pub fn get_or_create(&self, set: T) -> Result<Arc<T>, Error> {
        set.check_validity()?;
        let created = {
            let mut sets = self.inner.sets.lock().expect("Failed to lock descriptor sets");
            match sets.entry(Arc::new(set)) {
                Entry::Occupied(mut entry) => {
                    let count = entry.get_mut();
                    *count = count
                        .checked_add(1)
                        .ok_or_else(|| Error::invalid_state("descriptor set reference count overflowed"))?;
                    return Ok(entry.key().clone());
                }
                Entry::Vacant(entry) => {
                    let key = entry.key().clone();
                    entry.insert(1);
                    key
                }
            }
        };
        self.watch(&created);
        Ok(created)
    }

    /// Drops one reference to `set`. Returns the remaining count; at zero the
    /// set leaves the cache.
    pub fn release(&self, set: &Arc<T>) -> Result<u16, Error> {
        let remaining = {
            let mut sets = self.inner.sets.lock().expect("Failed to lock descriptor sets");
            let count = sets
                .get_mut(set.as_ref())
                .ok_or_else(|| Error::ItemNotFound("descriptor set is not in this cache".to_string()))?;
            *count -= 1;
            let remaining = *count;
            if remaining == 0 {
                sets.remove(set.as_ref());
            }
            remaining
        };
        if remaining == 0 {
            self.unwatch(set);
        }
        Ok(remaining)
    }

    pub fn ref_count(&self, set: &T) -> u16 {
        self.inner
            .sets
            .lock()
            .expect("Failed to lock descriptor sets")
            .get(set)
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.inner.sets.lock().expect("Failed to lock descriptor sets").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn watch(&self, set: &T) {
        let mut watched = self.inner.watched.lock().expect("Failed to lock watched textures");
        for texture in unique(set.referenced_textures()) {
            let watch = watched.entry(texture.id()).or_insert_with(|| {
                texture.add_listener(self.listener.clone());
                Watch {
                    texture: Arc::downgrade(&texture),
                    sets: 0,
                }
            });
            watch.sets += 1;
        }
    }

    fn unwatch(&self, set: &T) {
        let mut watched = self.inner.watched.lock().expect("Failed to lock watched textures");
        for texture in unique(set.referenced_textures()) {
            let Some(watch) = watched.get_mut(&texture.id()) else {
                continue;
            };
            watch.sets -= 1;
            if watch.sets == 0 {
                watched.remove(&texture.id());
                texture.remove_listener(&self.listener);
            }
        }
    }
}

fn unique(mut textures: Vec<Arc<TextureGpu>>) -> Vec<Arc<TextureGpu>> {
    textures.sort_by_key(|t| t.id());
    textures.dedup_by_key(|t| t.id());
    textures
}

impl<T: DescriptorSet> Default for DescriptorSetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DescriptorSet> std::fmt::Debug for DescriptorSetCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorSetCache").field("len", &self.len()).finish()
    }
}

impl<T: DescriptorSet> Drop for DescriptorSetCache<T> {
    fn drop(&mut self) {
        let watched = std::mem::take(&mut *self.inner.watched.lock().expect("Failed to lock watched textures"));
        for watch in watched.into_values() {
            if let Some(texture) = watch.texture.upgrade() {
                texture.remove_listener(&self.listener);
            }
        }
    }
}

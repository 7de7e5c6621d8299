// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::any::Any;
use std::fmt::Debug;
use std::sync::Mutex;

/// Backend-owned state attached to a descriptor set.
///
/// A backend stores whatever native binding object it built for the set here.
/// The slot is emptied when a referenced texture changes in a way that makes
/// the object stale, and the backend rebuilds it on next use.
///
/// Not part of a set's identity: equality, ordering and hashing ignore it, and
/// cloning a set yields an empty slot.
#[derive(Default)]
pub struct RsData(Mutex<Option<Box<dyn Any + Send + Sync>>>);

impl RsData {
    pub fn set(&self, data: Box<dyn Any + Send + Sync>) {
        *self.0.lock().expect("Failed to lock rs_data") = Some(data);
    }

    pub fn is_populated(&self) -> bool {
        self.0.lock().expect("Failed to lock rs_data").is_some()
    }

    /// Runs `f` with the stored data, if any.
    pub fn with<R>(&self, f: impl FnOnce(Option<&(dyn Any + Send + Sync)>) -> R) -> R {
        let guard = self.0.lock().expect("Failed to lock rs_data");
        f(guard.as_deref())
    }

    /// Drops the stored data. Returns whether anything was stored.
    pub fn invalidate(&self) -> bool {
        self.0.lock().expect("Failed to lock rs_data").take().is_some()
    }
}

impl Clone for RsData {
    fn clone(&self) -> Self {
        RsData::default()
    }
}

impl Debug for RsData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RsData").field(&self.is_populated()).finish()
    }
}

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a [`BufferPacked`]. Descriptor sets compare buffers by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// How the contents of a buffer are updated over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Written once at creation.
    Immutable,
    /// GPU-owned; updated through explicit uploads.
    Default,
    /// Rewritten by the CPU every frame.
    Dynamic,
    /// Persistently mapped; the CPU writes a different region each frame.
    DynamicPersistent,
    /// Persistently mapped and coherent.
    DynamicPersistentCoherent,
}

impl BufferType {
    /// Dynamic buffers change their bound region every frame, so they cannot
    /// be baked into a cached descriptor set.
    pub fn is_dynamic(self) -> bool {
        matches!(
            self,
            BufferType::Dynamic | BufferType::DynamicPersistent | BufferType::DynamicPersistentCoherent
        )
    }
}

/// A GPU buffer as seen by descriptor sets.
///
/// Only the properties that affect binding validity are tracked.
#[derive(Debug)]
pub struct BufferPacked {
    id: BufferId,
    name: String,
    buffer_type: BufferType,
    size_bytes: usize,
    uav: bool,
}

impl BufferPacked {
    pub fn new(name: impl Display, buffer_type: BufferType, size_bytes: usize) -> Self {
        BufferPacked {
            id: BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.to_string(),
            buffer_type,
            size_bytes,
            uav: false,
        }
    }

    /// Creates a buffer that can be bound for unordered access.
    pub fn new_uav(name: impl Display, buffer_type: BufferType, size_bytes: usize) -> Self {
        BufferPacked {
            uav: true,
            ..Self::new(name, buffer_type, size_bytes)
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer_type(&self) -> BufferType {
        self.buffer_type
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn is_uav(&self) -> bool {
        self.uav
    }

    /// Checks that `offset..offset + size_bytes` lies inside the buffer.
    /// A `size_bytes` of 0 means "to the end".
    pub(crate) fn check_range(&self, offset: usize, size_bytes: usize) -> Result<(), crate::error::Error> {
        let end = offset.checked_add(size_bytes);
        match end {
            Some(end) if offset <= self.size_bytes && end <= self.size_bytes => Ok(()),
            _ => Err(crate::error::Error::invalid_parameters(format!(
                "range {offset}+{size_bytes} is outside buffer {} of {} bytes",
                self.name, self.size_bytes
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn ids_are_unique() {
        let a = BufferPacked::new("a", BufferType::Default, 64);
        let b = BufferPacked::new("b", BufferType::Default, 64);
        assert_ne!(a.id(), b.id());
        assert!(!a.is_uav());
        assert!(BufferPacked::new_uav("c", BufferType::Default, 4).is_uav());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn ranges_are_checked() {
        let buffer = BufferPacked::new("constants", BufferType::Immutable, 256);
        buffer.check_range(0, 0).unwrap();
        buffer.check_range(128, 128).unwrap();
        buffer.check_range(256, 0).unwrap();
        assert!(buffer.check_range(200, 100).is_err());
        assert!(buffer.check_range(usize::MAX, 2).is_err());
        assert!(BufferType::DynamicPersistent.is_dynamic());
        assert!(!BufferType::Default.is_dynamic());
    }
}

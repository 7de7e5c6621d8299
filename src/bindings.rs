// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Descriptor sets: validated, structurally comparable bundles of bindings.

Three kinds exist. [`DescriptorSetTexture`] binds whole textures.
[`DescriptorSetTexture2`] binds texture views and buffer ranges.
[`DescriptorSetUav`] binds resources shaders write to. Each groups its slots by
[`ShaderType`] and is checked with `check_validity` before a backend bakes it.

Sets compare by content, so a [`DescriptorSetCache`] can collapse equal sets to
one shared instance.
*/

use crate::error::Error;

/// Implements equality, ordering and hashing through a private `key()` method.
macro_rules! ord_by_key {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.key() == other.key()
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.key().cmp(&other.key())
            }
        }

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.key().hash(state)
            }
        }
    };
}
pub(crate) use ord_by_key;

mod buffer;
mod descriptor_cache;
mod descriptor_set_texture;
mod descriptor_set_uav;
mod rs_data;
pub mod visible_to;

pub use buffer::{BufferId, BufferPacked, BufferType};
pub use descriptor_cache::{DescriptorSet, DescriptorSetCache};
pub use descriptor_set_texture::{BufferSlot, DescriptorSetTexture, DescriptorSetTexture2, Slot, TextureSlot};
pub use descriptor_set_uav::{DescriptorSetUav, UavBufferSlot, UavSlot, UavTextureSlot};
pub use rs_data::RsData;
pub use visible_to::{NUM_SHADER_TYPES, ResourceAccess, ShaderType};

/// Slot count must be nonzero and match the per-stage counts.
pub(crate) fn check_slot_counts(slots: usize, counts: &[u16; NUM_SHADER_TYPES]) -> Result<(), Error> {
    if slots == 0 {
        return Err(Error::invalid_parameters("a descriptor set needs at least one slot"));
    }
    let expected = visible_to::total_count(counts);
    if slots != expected {
        return Err(Error::invalid_parameters(format!(
            "descriptor set has {slots} slots but its shader stages account for {expected}"
        )));
    }
    Ok(())
}

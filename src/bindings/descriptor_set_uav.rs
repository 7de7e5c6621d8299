// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Unordered-access binding sets.

A [`DescriptorSetUav`] binds textures and buffers that shaders may write to.
Views of sRGB textures are always reinterpreted as the linear equivalent:
typed writes through an sRGB view are not available everywhere, so a slot that
would produce one is rejected.
*/

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::buffer::{BufferId, BufferPacked};
use super::descriptor_set_texture::check_subresource;
use super::rs_data::RsData;
use super::visible_to::{NUM_SHADER_TYPES, ResourceAccess, ShaderType, stage_range};
use super::{DescriptorSet, check_slot_counts};
use crate::error::Error;
use crate::pixel_formats::PixelFormatGpu;
use crate::textures::{TextureGpu, TextureId};

#[derive(Debug, Clone)]
pub struct UavBufferSlot {
    pub buffer: Arc<BufferPacked>,
    pub offset: usize,
    /// 0 binds everything from `offset` to the end.
    pub size_bytes: usize,
    pub access: ResourceAccess,
}

impl UavBufferSlot {
    pub fn new(buffer: Arc<BufferPacked>, access: ResourceAccess) -> Self {
        UavBufferSlot {
            buffer,
            offset: 0,
            size_bytes: 0,
            access,
        }
    }

    pub fn with_range(mut self, offset: usize, size_bytes: usize) -> Self {
        self.offset = offset;
        self.size_bytes = size_bytes;
        self
    }

    fn key(&self) -> (BufferId, usize, usize, ResourceAccess) {
        (self.buffer.id(), self.offset, self.size_bytes, self.access)
    }

    fn check_validity(&self) -> Result<(), Error> {
        check_access(self.access, self.buffer.name())?;
        if !self.buffer.is_uav() {
            return Err(Error::invalid_parameters(format!(
                "buffer {} was not created for unordered access",
                self.buffer.name()
            )));
        }
        self.buffer.check_range(self.offset, self.size_bytes)
    }
}

/// A single mip of a texture bound for unordered access.
#[derive(Debug, Clone)]
pub struct UavTextureSlot {
    pub texture: Arc<TextureGpu>,
    pub access: ResourceAccess,
    pub mipmap_level: u8,
    pub texture_array_index: u16,
    /// Format to view the texture as; `None` keeps the native format.
    pub pixel_format: Option<PixelFormatGpu>,
}

impl UavTextureSlot {
    pub fn new(texture: Arc<TextureGpu>, access: ResourceAccess) -> Self {
        UavTextureSlot {
            texture,
            access,
            mipmap_level: 0,
            texture_array_index: 0,
            pixel_format: None,
        }
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormatGpu) -> Self {
        self.pixel_format = Some(pixel_format);
        self
    }

    pub fn with_mipmap_level(mut self, mipmap_level: u8) -> Self {
        self.mipmap_level = mipmap_level;
        self
    }

    pub fn with_texture_array_index(mut self, index: u16) -> Self {
        self.texture_array_index = index;
        self
    }

    /// The format the shader sees.
    pub fn view_format(&self) -> PixelFormatGpu {
        self.pixel_format.unwrap_or_else(|| self.texture.pixel_format())
    }

    pub fn format_needs_reinterpret(&self) -> bool {
        self.view_format() != self.texture.pixel_format()
    }

    pub fn needs_different_view(&self) -> bool {
        self.format_needs_reinterpret() || self.mipmap_level != 0 || self.texture_array_index != 0
    }

    fn key(&self) -> (TextureId, ResourceAccess, u8, u16, Option<PixelFormatGpu>) {
        (
            self.texture.id(),
            self.access,
            self.mipmap_level,
            self.texture_array_index,
            self.pixel_format,
        )
    }

    fn check_validity(&self) -> Result<(), Error> {
        let texture = &self.texture;
        check_access(self.access, texture.name())?;
        if !texture.is_uav() {
            return Err(Error::invalid_parameters(format!(
                "texture {} was not created with the UAV flag",
                texture.name()
            )));
        }
        let native = texture.pixel_format();
        let view = self.view_format();
        if view.is_srgb() {
            return Err(Error::invalid_parameters(format!(
                "texture {} is bound for unordered access as {}; sRGB views must be reinterpreted as {}",
                texture.name(),
                view.name(),
                view.equivalent_linear().name()
            )));
        }
        // An sRGB texture viewed as its linear twin is always allowed.
        if view != native && view != native.equivalent_linear() && !texture.is_reinterpretable() {
            return Err(Error::invalid_parameters(format!(
                "texture {} is viewed as {} but was not created REINTERPRETABLE",
                texture.name(),
                view.name()
            )));
        }
        check_subresource(texture, self.mipmap_level, 1, self.texture_array_index)
    }
}

fn check_access(access: ResourceAccess, name: &str) -> Result<(), Error> {
    if access == ResourceAccess::Undefined {
        Err(Error::invalid_parameters(format!(
            "unordered access to {name} needs a defined access mode"
        )))
    } else {
        Ok(())
    }
}

super::ord_by_key!(UavBufferSlot);
super::ord_by_key!(UavTextureSlot);

/// One binding of a [`DescriptorSetUav`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UavSlot {
    Buffer(UavBufferSlot),
    Texture(UavTextureSlot),
}

impl UavSlot {
    pub fn needs_different_view(&self) -> bool {
        match self {
            UavSlot::Buffer(_) => false,
            UavSlot::Texture(slot) => slot.needs_different_view(),
        }
    }

    pub fn access(&self) -> ResourceAccess {
        match self {
            UavSlot::Buffer(slot) => slot.access,
            UavSlot::Texture(slot) => slot.access,
        }
    }

    pub fn texture(&self) -> Option<&Arc<TextureGpu>> {
        match self {
            UavSlot::Buffer(_) => None,
            UavSlot::Texture(slot) => Some(&slot.texture),
        }
    }

    fn check_validity(&self) -> Result<(), Error> {
        match self {
            UavSlot::Buffer(slot) => slot.check_validity(),
            UavSlot::Texture(slot) => slot.check_validity(),
        }
    }
}

impl From<UavBufferSlot> for UavSlot {
    fn from(slot: UavBufferSlot) -> Self {
        UavSlot::Buffer(slot)
    }
}

impl From<UavTextureSlot> for UavSlot {
    fn from(slot: UavTextureSlot) -> Self {
        UavSlot::Texture(slot)
    }
}

/// Textures and buffers bound for unordered access, grouped by shader stage.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetUav {
    slots: Vec<UavSlot>,
    shader_type_tex_count: [u16; NUM_SHADER_TYPES],
    rs_data: RsData,
}

impl DescriptorSetUav {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(slots: Vec<UavSlot>, shader_type_tex_count: [u16; NUM_SHADER_TYPES]) -> Self {
        DescriptorSetUav {
            slots,
            shader_type_tex_count,
            rs_data: RsData::default(),
        }
    }

    pub fn push_slot(&mut self, stage: ShaderType, slot: impl Into<UavSlot>) {
        let end = stage_range(&self.shader_type_tex_count, stage).end;
        self.slots.insert(end, slot.into());
        self.shader_type_tex_count[stage.index()] += 1;
    }

    pub fn slots(&self) -> &[UavSlot] {
        &self.slots
    }

    pub fn slots_for(&self, stage: ShaderType) -> &[UavSlot] {
        &self.slots[stage_range(&self.shader_type_tex_count, stage)]
    }

    pub fn shader_type_tex_count(&self) -> &[u16; NUM_SHADER_TYPES] {
        &self.shader_type_tex_count
    }

    pub fn rs_data(&self) -> &RsData {
        &self.rs_data
    }

    pub fn check_validity(&self) -> Result<(), Error> {
        check_slot_counts(self.slots.len(), &self.shader_type_tex_count)?;
        self.slots.iter().try_for_each(UavSlot::check_validity)
    }

    fn key(&self) -> (usize, &[UavSlot], &[u16; NUM_SHADER_TYPES]) {
        (self.slots.len(), &self.slots, &self.shader_type_tex_count)
    }
}

super::ord_by_key!(DescriptorSetUav);

impl DescriptorSet for DescriptorSetUav {
    fn check_validity(&self) -> Result<(), Error> {
        Self::check_validity(self)
    }

    fn referenced_textures(&self) -> Vec<Arc<TextureGpu>> {
        self.slots.iter().filter_map(UavSlot::texture).cloned().collect()
    }

    fn rs_data(&self) -> &RsData {
        &self.rs_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::BufferType;
    use crate::config::ResidencyConfig;
    use crate::error::ErrorKind;
    use crate::imp::nop::NopBackend;
    use crate::textures::{TextureFlags, TextureGpuManager, TextureType};

    fn uav_texture(manager: &TextureGpuManager, name: &str, format: PixelFormatGpu, flags: TextureFlags) -> Arc<TextureGpu> {
        manager
            .texture(name, TextureType::Type2D)
            .with_flags(flags)
            .with_resolution(32, 32, 1)
            .with_pixel_format(format)
            .build()
            .unwrap()
    }

    fn single(slot: impl Into<UavSlot>) -> DescriptorSetUav {
        let mut set = DescriptorSetUav::new();
        set.push_slot(ShaderType::Pixel, slot);
        set
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn srgb_views_are_rejected() {
        let manager = TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default());
        let srgb = uav_texture(&manager, "srgb", PixelFormatGpu::Rgba8UnormSrgb, TextureFlags::UAV);
        let set = single(UavTextureSlot::new(srgb.clone(), ResourceAccess::Write));
        assert_eq!(set.check_validity().unwrap_err().kind(), ErrorKind::InvalidParameters);

        let linear = single(
            UavTextureSlot::new(srgb, ResourceAccess::Write).with_pixel_format(PixelFormatGpu::Rgba8Unorm),
        );
        linear.check_validity().unwrap();
        assert!(linear.slots()[0].needs_different_view());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn textures_need_the_uav_flag_and_an_access() {
        let manager = TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default());
        let plain = uav_texture(&manager, "plain", PixelFormatGpu::R32Float, TextureFlags::empty());
        let uav = uav_texture(&manager, "uav", PixelFormatGpu::R32Float, TextureFlags::UAV);
        assert!(single(UavTextureSlot::new(plain, ResourceAccess::ReadWrite)).check_validity().is_err());
        assert!(single(UavTextureSlot::new(uav.clone(), ResourceAccess::Undefined)).check_validity().is_err());
        assert!(
            single(UavTextureSlot::new(uav.clone(), ResourceAccess::Read).with_pixel_format(PixelFormatGpu::R32Uint))
                .check_validity()
                .is_err()
        );
        let set = single(UavTextureSlot::new(uav, ResourceAccess::ReadWrite));
        set.check_validity().unwrap();
        assert!(!set.slots()[0].needs_different_view());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn buffers_need_uav_capability() {
        let plain = Arc::new(BufferPacked::new("plain", BufferType::Default, 64));
        let uav = Arc::new(BufferPacked::new_uav("uav", BufferType::Default, 64));
        assert!(single(UavBufferSlot::new(plain, ResourceAccess::Write)).check_validity().is_err());
        assert!(
            single(UavBufferSlot::new(uav.clone(), ResourceAccess::Write).with_range(32, 64))
                .check_validity()
                .is_err()
        );
        single(UavBufferSlot::new(uav, ResourceAccess::Write).with_range(32, 32))
            .check_validity()
            .unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn access_is_part_of_identity() {
        let uav = Arc::new(BufferPacked::new_uav("uav", BufferType::Default, 64));
        let read = single(UavBufferSlot::new(uav.clone(), ResourceAccess::Read));
        let write = single(UavBufferSlot::new(uav.clone(), ResourceAccess::Write));
        assert_ne!(read, write);
        assert_eq!(read, single(UavBufferSlot::new(uav, ResourceAccess::Read)));
    }
}

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Read-only binding sets: [`DescriptorSetTexture`] binds plain textures,
[`DescriptorSetTexture2`] binds textures with view overrides and buffers.
*/

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::buffer::BufferPacked;
use super::rs_data::RsData;
use super::visible_to::{NUM_SHADER_TYPES, ShaderType, stage_range};
use super::{DescriptorSet, check_slot_counts};
use crate::error::Error;
use crate::pixel_formats::PixelFormatGpu;
use crate::textures::{TextureGpu, TextureId};

/// Textures bound with their default views, grouped by shader stage.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetTexture {
    textures: Vec<Arc<TextureGpu>>,
    shader_type_tex_count: [u16; NUM_SHADER_TYPES],
    rs_data: RsData,
}

impl DescriptorSetTexture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from an already laid out texture list.
    ///
    /// Nothing is checked until [`check_validity`](Self::check_validity).
    pub fn from_parts(textures: Vec<Arc<TextureGpu>>, shader_type_tex_count: [u16; NUM_SHADER_TYPES]) -> Self {
        DescriptorSetTexture {
            textures,
            shader_type_tex_count,
            rs_data: RsData::default(),
        }
    }

    /// Appends `texture` to the slots of `stage`.
    pub fn push_texture(&mut self, stage: ShaderType, texture: Arc<TextureGpu>) {
        let end = stage_range(&self.shader_type_tex_count, stage).end;
        self.textures.insert(end, texture);
        self.shader_type_tex_count[stage.index()] += 1;
    }

    pub fn textures(&self) -> &[Arc<TextureGpu>] {
        &self.textures
    }

    pub fn textures_for(&self, stage: ShaderType) -> &[Arc<TextureGpu>] {
        &self.textures[stage_range(&self.shader_type_tex_count, stage)]
    }

    pub fn shader_type_tex_count(&self) -> &[u16; NUM_SHADER_TYPES] {
        &self.shader_type_tex_count
    }

    pub fn rs_data(&self) -> &RsData {
        &self.rs_data
    }

    pub fn check_validity(&self) -> Result<(), Error> {
        check_slot_counts(self.textures.len(), &self.shader_type_tex_count)?;
        for texture in &self.textures {
            check_sampleable(texture)?;
        }
        Ok(())
    }

    fn texture_ids(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.textures.iter().map(|t| t.id())
    }
}

impl PartialEq for DescriptorSetTexture {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DescriptorSetTexture {}

impl PartialOrd for DescriptorSetTexture {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DescriptorSetTexture {
    fn cmp(&self, other: &Self) -> Ordering {
        self.textures
            .len()
            .cmp(&other.textures.len())
            .then_with(|| self.texture_ids().cmp(other.texture_ids()))
            .then_with(|| self.shader_type_tex_count.cmp(&other.shader_type_tex_count))
    }
}

impl Hash for DescriptorSetTexture {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.textures.len().hash(state);
        for id in self.texture_ids() {
            id.hash(state);
        }
        self.shader_type_tex_count.hash(state);
    }
}

impl DescriptorSet for DescriptorSetTexture {
    fn check_validity(&self) -> Result<(), Error> {
        Self::check_validity(self)
    }

    fn referenced_textures(&self) -> Vec<Arc<TextureGpu>> {
        self.textures.clone()
    }

    fn rs_data(&self) -> &RsData {
        &self.rs_data
    }
}

fn check_sampleable(texture: &TextureGpu) -> Result<(), Error> {
    if texture.is_texture() {
        Ok(())
    } else {
        Err(Error::invalid_parameters(format!(
            "texture {} was created with NOT_TEXTURE and cannot be sampled",
            texture.name()
        )))
    }
}

/// A range of a buffer bound for reading.
#[derive(Debug, Clone)]
pub struct BufferSlot {
    pub buffer: Arc<BufferPacked>,
    pub offset: usize,
    /// 0 binds everything from `offset` to the end.
    pub size_bytes: usize,
}

impl BufferSlot {
    pub fn new(buffer: Arc<BufferPacked>) -> Self {
        BufferSlot {
            buffer,
            offset: 0,
            size_bytes: 0,
        }
    }

    pub fn with_range(mut self, offset: usize, size_bytes: usize) -> Self {
        self.offset = offset;
        self.size_bytes = size_bytes;
        self
    }

    fn key(&self) -> (super::BufferId, usize, usize) {
        (self.buffer.id(), self.offset, self.size_bytes)
    }
}

/// A texture bound through a view.
///
/// The defaults select the texture's own view: its native format, every mip
/// and every slice.
#[derive(Debug, Clone)]
pub struct TextureSlot {
    pub texture: Arc<TextureGpu>,
    /// Format to view the texture as; `None` keeps the native format.
    pub pixel_format: Option<PixelFormatGpu>,
    /// First mip visible through the view.
    pub mipmap_level: u8,
    /// Number of visible mips; 0 means "all remaining".
    pub num_mipmaps: u8,
    /// First array slice visible through the view.
    pub texture_array_index: u16,
    /// View cubemaps as 2D arrays of faces.
    pub cubemaps_as_2d_arrays: bool,
}

impl TextureSlot {
    pub fn new(texture: Arc<TextureGpu>) -> Self {
        TextureSlot {
            texture,
            pixel_format: None,
            mipmap_level: 0,
            num_mipmaps: 0,
            texture_array_index: 0,
            cubemaps_as_2d_arrays: false,
        }
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormatGpu) -> Self {
        self.pixel_format = Some(pixel_format);
        self
    }

    pub fn with_mipmaps(mut self, mipmap_level: u8, num_mipmaps: u8) -> Self {
        self.mipmap_level = mipmap_level;
        self.num_mipmaps = num_mipmaps;
        self
    }

    pub fn with_texture_array_index(mut self, index: u16) -> Self {
        self.texture_array_index = index;
        self
    }

    pub fn with_cubemaps_as_2d_arrays(mut self, enabled: bool) -> Self {
        self.cubemaps_as_2d_arrays = enabled;
        self
    }

    /// Whether the view uses a different format than the texture.
    pub fn format_needs_reinterpret(&self) -> bool {
        self.pixel_format
            .is_some_and(|format| format != self.texture.pixel_format())
    }

    /// Whether the backend must create a view other than the texture's default one.
    pub fn needs_different_view(&self) -> bool {
        self.format_needs_reinterpret()
            || self.mipmap_level != 0
            || self.num_mipmaps != 0
            || self.texture_array_index != 0
            || self.cubemaps_as_2d_arrays
    }

    fn key(&self) -> (TextureId, Option<PixelFormatGpu>, u8, u8, u16, bool) {
        (
            self.texture.id(),
            self.pixel_format,
            self.mipmap_level,
            self.num_mipmaps,
            self.texture_array_index,
            self.cubemaps_as_2d_arrays,
        )
    }

    fn check_validity(&self) -> Result<(), Error> {
        let texture = &self.texture;
        check_sampleable(texture)?;
        if self.format_needs_reinterpret() && !texture.is_reinterpretable() {
            return Err(Error::invalid_parameters(format!(
                "texture {} is viewed as a different format but was not created REINTERPRETABLE",
                texture.name()
            )));
        }
        check_subresource(texture, self.mipmap_level, self.num_mipmaps, self.texture_array_index)
    }
}

/// Checks that a view's first mip, mip count and first slice exist in `texture`.
pub(super) fn check_subresource(
    texture: &TextureGpu,
    mipmap_level: u8,
    num_mipmaps: u8,
    texture_array_index: u16,
) -> Result<(), Error> {
    let total_mips = texture.num_mipmaps();
    if mipmap_level >= total_mips || mipmap_level as u16 + num_mipmaps as u16 > total_mips as u16 {
        return Err(Error::invalid_parameters(format!(
            "mips {mipmap_level}+{num_mipmaps} are outside texture {} with {total_mips} mips",
            texture.name()
        )));
    }
    if texture_array_index as u32 >= texture.num_slices() {
        return Err(Error::invalid_parameters(format!(
            "slice {texture_array_index} is outside texture {} with {} slices",
            texture.name(),
            texture.num_slices()
        )));
    }
    Ok(())
}

/// One binding of a [`DescriptorSetTexture2`].
#[derive(Debug, Clone)]
pub enum Slot {
    Buffer(BufferSlot),
    Texture(TextureSlot),
}

impl Slot {
    pub fn needs_different_view(&self) -> bool {
        match self {
            Slot::Buffer(_) => false,
            Slot::Texture(slot) => slot.needs_different_view(),
        }
    }

    pub fn texture(&self) -> Option<&Arc<TextureGpu>> {
        match self {
            Slot::Buffer(_) => None,
            Slot::Texture(slot) => Some(&slot.texture),
        }
    }

    fn check_validity(&self) -> Result<(), Error> {
        match self {
            Slot::Buffer(slot) => {
                if slot.buffer.buffer_type().is_dynamic() {
                    return Err(Error::invalid_parameters(format!(
                        "dynamic buffer {} cannot be baked into a descriptor set",
                        slot.buffer.name()
                    )));
                }
                slot.buffer.check_range(slot.offset, slot.size_bytes)
            }
            Slot::Texture(slot) => slot.check_validity(),
        }
    }
}

impl From<TextureSlot> for Slot {
    fn from(slot: TextureSlot) -> Self {
        Slot::Texture(slot)
    }
}

impl From<BufferSlot> for Slot {
    fn from(slot: BufferSlot) -> Self {
        Slot::Buffer(slot)
    }
}

super::ord_by_key!(BufferSlot);
super::ord_by_key!(TextureSlot);

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Slot::Buffer(a), Slot::Buffer(b)) => a.cmp(b),
            (Slot::Texture(a), Slot::Texture(b)) => a.cmp(b),
            (Slot::Buffer(_), Slot::Texture(_)) => Ordering::Less,
            (Slot::Texture(_), Slot::Buffer(_)) => Ordering::Greater,
        }
    }
}

impl Hash for Slot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Slot::Buffer(slot) => {
                0u8.hash(state);
                slot.hash(state);
            }
            Slot::Texture(slot) => {
                1u8.hash(state);
                slot.hash(state);
            }
        }
    }
}

/// Textures and buffers bound for reading, grouped by shader stage.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetTexture2 {
    slots: Vec<Slot>,
    shader_type_tex_count: [u16; NUM_SHADER_TYPES],
    rs_data: RsData,
}

impl DescriptorSetTexture2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(slots: Vec<Slot>, shader_type_tex_count: [u16; NUM_SHADER_TYPES]) -> Self {
        DescriptorSetTexture2 {
            slots,
            shader_type_tex_count,
            rs_data: RsData::default(),
        }
    }

    /// Appends `slot` to the slots of `stage`.
    pub fn push_slot(&mut self, stage: ShaderType, slot: impl Into<Slot>) {
        let end = stage_range(&self.shader_type_tex_count, stage).end;
        self.slots.insert(end, slot.into());
        self.shader_type_tex_count[stage.index()] += 1;
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slots_for(&self, stage: ShaderType) -> &[Slot] {
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
        self.slots.iter().try_for_each(Slot::check_validity)
    }

    fn key(&self) -> (usize, &[Slot], &[u16; NUM_SHADER_TYPES]) {
        (self.slots.len(), &self.slots, &self.shader_type_tex_count)
    }
}

super::ord_by_key!(DescriptorSetTexture2);

impl DescriptorSet for DescriptorSetTexture2 {
    fn check_validity(&self) -> Result<(), Error> {
        Self::check_validity(self)
    }

    fn referenced_textures(&self) -> Vec<Arc<TextureGpu>> {
        self.slots.iter().filter_map(Slot::texture).cloned().collect()
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

    fn manager() -> TextureGpuManager {
        TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default())
    }

    fn texture(manager: &TextureGpuManager, name: &str, flags: TextureFlags) -> Arc<TextureGpu> {
        manager
            .texture(name, TextureType::Type2D)
            .with_flags(flags)
            .with_resolution(64, 64, 1)
            .with_pixel_format(PixelFormatGpu::Rgba8Unorm)
            .with_num_mipmaps(4)
            .build()
            .unwrap()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn textures_are_grouped_by_stage() {
        let manager = manager();
        let a = texture(&manager, "a", TextureFlags::empty());
        let b = texture(&manager, "b", TextureFlags::empty());
        let c = texture(&manager, "c", TextureFlags::empty());
        let mut set = DescriptorSetTexture::new();
        set.push_texture(ShaderType::Pixel, a.clone());
        set.push_texture(ShaderType::Vertex, b.clone());
        set.push_texture(ShaderType::Pixel, c.clone());
        assert_eq!(set.shader_type_tex_count(), &[1, 2, 0, 0, 0]);
        let ids: Vec<_> = set.textures().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![b.id(), a.id(), c.id()]);
        assert_eq!(set.textures_for(ShaderType::Pixel).len(), 2);
        set.check_validity().unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn counts_must_match_slots() {
        let manager = manager();
        let a = texture(&manager, "a", TextureFlags::empty());
        let empty = DescriptorSetTexture::new();
        assert_eq!(empty.check_validity().unwrap_err().kind(), ErrorKind::InvalidParameters);
        let mismatched = DescriptorSetTexture::from_parts(vec![a], [0, 2, 0, 0, 0]);
        assert_eq!(mismatched.check_validity().unwrap_err().kind(), ErrorKind::InvalidParameters);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn non_textures_cannot_be_sampled() {
        let manager = manager();
        let target = texture(&manager, "depth only", TextureFlags::NOT_TEXTURE | TextureFlags::RENDER_TO_TEXTURE);
        let mut set = DescriptorSetTexture2::new();
        set.push_slot(ShaderType::Pixel, TextureSlot::new(target));
        assert_eq!(set.check_validity().unwrap_err().kind(), ErrorKind::InvalidParameters);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn reinterpretation_needs_the_flag() {
        let manager = manager();
        let plain = texture(&manager, "plain", TextureFlags::empty());
        let reinterpretable = texture(&manager, "reinterpretable", TextureFlags::REINTERPRETABLE);

        let mut set = DescriptorSetTexture2::new();
        set.push_slot(
            ShaderType::Pixel,
            TextureSlot::new(plain.clone()).with_pixel_format(PixelFormatGpu::Rgba8UnormSrgb),
        );
        assert_eq!(set.check_validity().unwrap_err().kind(), ErrorKind::InvalidParameters);

        let mut set = DescriptorSetTexture2::new();
        set.push_slot(
            ShaderType::Pixel,
            TextureSlot::new(reinterpretable).with_pixel_format(PixelFormatGpu::Rgba8UnormSrgb),
        );
        set.check_validity().unwrap();

        // Naming the native format is not a reinterpretation.
        let same = TextureSlot::new(plain).with_pixel_format(PixelFormatGpu::Rgba8Unorm);
        assert!(!same.format_needs_reinterpret());
        assert!(!same.needs_different_view());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn buffers_must_be_static_and_in_range() {
        let manager = manager();
        let a = texture(&manager, "a", TextureFlags::empty());
        let dynamic = Arc::new(BufferPacked::new("per frame", BufferType::Dynamic, 256));
        let constant = Arc::new(BufferPacked::new("constants", BufferType::Immutable, 256));

        let mut set = DescriptorSetTexture2::new();
        set.push_slot(ShaderType::Vertex, BufferSlot::new(dynamic));
        set.push_slot(ShaderType::Pixel, TextureSlot::new(a.clone()));
        assert_eq!(set.check_validity().unwrap_err().kind(), ErrorKind::InvalidParameters);

        let mut set = DescriptorSetTexture2::new();
        set.push_slot(ShaderType::Vertex, BufferSlot::new(constant.clone()).with_range(192, 128));
        assert_eq!(set.check_validity().unwrap_err().kind(), ErrorKind::InvalidParameters);

        let mut set = DescriptorSetTexture2::new();
        set.push_slot(ShaderType::Vertex, BufferSlot::new(constant).with_range(128, 128));
        set.push_slot(ShaderType::Pixel, TextureSlot::new(a));
        set.check_validity().unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn views_are_checked_against_the_texture() {
        let manager = manager();
        let a = texture(&manager, "a", TextureFlags::empty());
        let out_of_range = TextureSlot::new(a.clone()).with_mipmaps(2, 3);
        assert!(out_of_range.check_validity().is_err());
        let slice = TextureSlot::new(a.clone()).with_texture_array_index(1);
        assert!(slice.check_validity().is_err());
        let view = TextureSlot::new(a).with_mipmaps(1, 3);
        view.check_validity().unwrap();
        assert!(view.needs_different_view());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn buffers_sort_before_textures() {
        let manager = manager();
        let a = texture(&manager, "a", TextureFlags::empty());
        let buffer = Arc::new(BufferPacked::new("constants", BufferType::Default, 16));
        let buffer_slot = Slot::from(BufferSlot::new(buffer));
        let texture_slot = Slot::from(TextureSlot::new(a));
        assert!(buffer_slot < texture_slot);
        assert!(!buffer_slot.needs_different_view());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn shorter_sets_sort_first() {
        let manager = manager();
        let a = texture(&manager, "a", TextureFlags::empty());
        let b = texture(&manager, "b", TextureFlags::empty());
        let mut one = DescriptorSetTexture2::new();
        one.push_slot(ShaderType::Pixel, TextureSlot::new(b.clone()));
        let mut two = DescriptorSetTexture2::new();
        two.push_slot(ShaderType::Pixel, TextureSlot::new(a));
        two.push_slot(ShaderType::Pixel, TextureSlot::new(b));
        assert!(one < two);
    }
}

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Descriptor set validation, identity and sharing through the public API.

use std::collections::BTreeSet;
use std::sync::Arc;

use textures_and_passes::bindings::{
    BufferPacked, BufferSlot, BufferType, DescriptorSetCache, DescriptorSetTexture, DescriptorSetTexture2,
    DescriptorSetUav, ResourceAccess, ShaderType, Slot, TextureSlot, UavBufferSlot, UavTextureSlot,
};
use textures_and_passes::config::ResidencyConfig;
use textures_and_passes::error::ErrorKind;
use textures_and_passes::imp::nop::NopBackend;
use textures_and_passes::pixel_formats::PixelFormatGpu;
use textures_and_passes::textures::{GpuResidency, TextureFlags, TextureGpu, TextureGpuManager, TextureType};

fn manager() -> TextureGpuManager {
    TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default())
}

fn texture(manager: &TextureGpuManager, name: &str, flags: TextureFlags, format: PixelFormatGpu) -> Arc<TextureGpu> {
    manager
        .texture(name, TextureType::Type2D)
        .with_flags(flags)
        .with_resolution(64, 64, 1)
        .with_pixel_format(format)
        .with_num_mipmaps(4)
        .build()
        .unwrap()
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn structurally_identical_sets_are_equal() {
    let manager = manager();
    let diffuse = texture(&manager, "diffuse", TextureFlags::empty(), PixelFormatGpu::Rgba8Unorm);
    let params = Arc::new(BufferPacked::new("params", BufferType::Default, 256));

    let build = || {
        let mut set = DescriptorSetTexture2::new();
        set.push_slot(ShaderType::Pixel, TextureSlot::new(diffuse.clone()).with_mipmaps(1, 2));
        set.push_slot(ShaderType::Vertex, BufferSlot::new(params.clone()).with_range(0, 128));
        set
    };
    let a = build();
    let b = build();
    b.rs_data().set(Box::new(7u32));

    assert_eq!(a, b);
    assert!(!(a < b) && !(b < a));
    let unique: BTreeSet<_> = [a, b].into_iter().collect();
    assert_eq!(unique.len(), 1);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn vertex_and_pixel_bindings_validate_together() {
    let manager = manager();
    let diffuse = texture(&manager, "diffuse", TextureFlags::empty(), PixelFormatGpu::Rgba8Unorm);
    let height = texture(&manager, "height", TextureFlags::empty(), PixelFormatGpu::R8Unorm);
    let params = Arc::new(BufferPacked::new("params", BufferType::Immutable, 64));

    let mut set = DescriptorSetTexture2::new();
    set.push_slot(ShaderType::Pixel, TextureSlot::new(diffuse.clone()));
    set.push_slot(ShaderType::Vertex, TextureSlot::new(height.clone()));
    set.push_slot(ShaderType::Vertex, BufferSlot::new(params));
    set.check_validity().unwrap();

    assert_eq!(set.shader_type_tex_count()[ShaderType::Vertex.index()], 2);
    assert_eq!(set.shader_type_tex_count()[ShaderType::Pixel.index()], 1);
    assert_eq!(set.slots_for(ShaderType::Vertex).len(), 2);
    assert_eq!(
        set.slots_for(ShaderType::Pixel)[0].texture().map(|t| t.id()),
        Some(diffuse.id())
    );
    assert!(set.slots().iter().all(|slot| !slot.needs_different_view()));

    let dynamic = Arc::new(BufferPacked::new("per frame", BufferType::Dynamic, 64));
    let mut bad = set.clone();
    bad.push_slot(ShaderType::Pixel, BufferSlot::new(dynamic));
    assert_eq!(bad.check_validity().unwrap_err().kind(), ErrorKind::InvalidParameters);

    let mut out_of_range = DescriptorSetTexture2::new();
    out_of_range.push_slot(ShaderType::Pixel, TextureSlot::new(height).with_mipmaps(3, 2));
    assert_eq!(
        out_of_range.check_validity().unwrap_err().kind(),
        ErrorKind::InvalidParameters
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn empty_sets_are_rejected() {
    assert_eq!(
        DescriptorSetTexture::new().check_validity().unwrap_err().kind(),
        ErrorKind::InvalidParameters
    );
    assert_eq!(
        DescriptorSetTexture2::from_parts(Vec::<Slot>::new(), [0; 5])
            .check_validity()
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidParameters
    );
    assert_eq!(
        DescriptorSetUav::new().check_validity().unwrap_err().kind(),
        ErrorKind::InvalidParameters
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn uav_sets_reject_srgb_views() {
    let manager = manager();
    let target = texture(
        &manager,
        "lighting",
        TextureFlags::UAV | TextureFlags::REINTERPRETABLE,
        PixelFormatGpu::Rgba8UnormSrgb,
    );

    let mut srgb = DescriptorSetUav::new();
    srgb.push_slot(ShaderType::Pixel, UavTextureSlot::new(target.clone(), ResourceAccess::Write));
    assert_eq!(srgb.check_validity().unwrap_err().kind(), ErrorKind::InvalidParameters);

    let mut linear = DescriptorSetUav::new();
    linear.push_slot(
        ShaderType::Pixel,
        UavTextureSlot::new(target, ResourceAccess::Write).with_pixel_format(PixelFormatGpu::Rgba8Unorm),
    );
    linear.check_validity().unwrap();
    assert!(linear.slots()[0].needs_different_view());
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn uav_buffers_and_textures_mix() {
    let manager = manager();
    let target = texture(&manager, "particles", TextureFlags::UAV, PixelFormatGpu::Rgba16Float);
    let counters = Arc::new(BufferPacked::new_uav("counters", BufferType::Default, 1024));

    let mut set = DescriptorSetUav::new();
    set.push_slot(ShaderType::Vertex, UavBufferSlot::new(counters, ResourceAccess::ReadWrite));
    set.push_slot(ShaderType::Vertex, UavTextureSlot::new(target, ResourceAccess::Read).with_mipmap_level(2));
    set.check_validity().unwrap();
    assert_eq!(set.slots()[0].access(), ResourceAccess::ReadWrite);
    assert!(set.slots()[0].texture().is_none());
    assert!(set.slots()[1].needs_different_view());
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn cache_shares_sets_and_drops_backend_data_on_residency_change() {
    let manager = manager();
    let diffuse = texture(&manager, "diffuse", TextureFlags::MANUAL_TEXTURE, PixelFormatGpu::Rgba8Unorm);
    let cache = DescriptorSetCache::<DescriptorSetTexture>::new();

    let mut set = DescriptorSetTexture::new();
    set.push_texture(ShaderType::Pixel, diffuse.clone());
    let first = cache.get_or_create(set.clone()).unwrap();
    let second = cache.get_or_create(set.clone()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.ref_count(&set), 2);

    first.rs_data().set(Box::new("backend bind group"));
    diffuse.schedule_transition_to(GpuResidency::Resident).unwrap();
    manager.process_queue();
    assert!(!first.rs_data().is_populated());

    assert_eq!(cache.release(&first).unwrap(), 1);
    assert_eq!(cache.release(&second).unwrap(), 0);
    assert!(cache.is_empty());
    assert_eq!(cache.release(&first).unwrap_err().kind(), ErrorKind::ItemNotFound);
    assert_eq!(diffuse.listener_count(), 0);
}

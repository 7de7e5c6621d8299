// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Render pass descriptors built the way a compositor builds them.

use std::sync::Arc;

use textures_and_passes::config::ResidencyConfig;
use textures_and_passes::error::ErrorKind;
use textures_and_passes::imp::nop::NopBackend;
use textures_and_passes::passes::{
    EntryTypes, FrameBufferDescKey, LoadAction, RenderPassDescriptor, RenderPassTarget, StoreAction,
};
use textures_and_passes::pixel_formats::PixelFormatGpu;
use textures_and_passes::textures::{
    MsaaPattern, SampleDescription, TextureFlags, TextureGpu, TextureGpuManager, TextureType,
};

struct Scene {
    manager: TextureGpuManager,
}

impl Scene {
    fn new() -> Self {
        Scene {
            manager: TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default()),
        }
    }

    fn target(&self, name: &str, flags: TextureFlags, format: PixelFormatGpu, samples: u8) -> Arc<TextureGpu> {
        self.manager
            .texture(name, TextureType::Type2D)
            .with_flags(flags)
            .with_resolution(1280, 720, 1)
            .with_pixel_format(format)
            .with_sample_description(SampleDescription::new(samples, MsaaPattern::Standard))
            .build()
            .unwrap()
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn explicit_resolve_without_a_destination_fails() {
    let scene = Scene::new();
    let msaa = scene.target(
        "msaa",
        TextureFlags::RENDER_TO_TEXTURE | TextureFlags::MSAA_EXPLICIT_RESOLVE,
        PixelFormatGpu::Rgba8Unorm,
        4,
    );
    let mut desc = RenderPassDescriptor::new();
    desc.colour[0].target = RenderPassTarget::new(msaa).with_actions(LoadAction::Clear, StoreAction::MultisampleResolve);
    let err = desc.entries_modified(EntryTypes::ALL).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameters);
    assert_eq!(desc.num_colour_entries(), 0);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn memoryless_msaa_must_resolve_elsewhere() {
    let scene = Scene::new();
    let msaa = scene.target(
        "msaa",
        TextureFlags::RENDER_TO_TEXTURE | TextureFlags::MSAA_EXPLICIT_RESOLVE | TextureFlags::TILER_MEMORYLESS,
        PixelFormatGpu::Rgba8Unorm,
        4,
    );
    let resolved = scene.target("resolved", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);

    let mut stored = RenderPassDescriptor::new();
    stored.colour[0].target = RenderPassTarget::new(msaa.clone())
        .with_resolve_texture(resolved.clone())
        .with_actions(LoadAction::Clear, StoreAction::Store);
    assert_eq!(
        stored.entries_modified(EntryTypes::ALL).unwrap_err().kind(),
        ErrorKind::InvalidParameters
    );

    let mut loaded = RenderPassDescriptor::new();
    loaded.colour[0].target = RenderPassTarget::new(msaa.clone())
        .with_resolve_texture(resolved.clone())
        .with_actions(LoadAction::Load, StoreAction::MultisampleResolve);
    assert_eq!(
        loaded.entries_modified(EntryTypes::ALL).unwrap_err().kind(),
        ErrorKind::InvalidParameters
    );

    let mut resolving = RenderPassDescriptor::new();
    resolving.colour[0].target = RenderPassTarget::new(msaa)
        .with_resolve_texture(resolved.clone())
        .with_actions(LoadAction::DontCare, StoreAction::MultisampleResolve);
    resolving.entries_modified(EntryTypes::ALL).unwrap();
    assert_eq!(resolving.num_colour_entries(), 1);
    assert!(resolving.has_attachment(&resolved));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn resolving_into_a_memoryless_texture_fails() {
    let scene = Scene::new();
    let msaa = scene.target("msaa", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 4);
    let memoryless = scene.target(
        "memoryless",
        TextureFlags::RENDER_TO_TEXTURE | TextureFlags::TILER_MEMORYLESS,
        PixelFormatGpu::Rgba8Unorm,
        1,
    );
    let mut desc = RenderPassDescriptor::new();
    desc.colour[0].target = RenderPassTarget::new(msaa).with_resolve_texture(memoryless);
    assert_eq!(
        desc.entries_modified(EntryTypes::ALL).unwrap_err().kind(),
        ErrorKind::InvalidParameters
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn non_msaa_window_drops_its_resolve_texture() {
    let scene = Scene::new();
    let window = scene.target(
        "window",
        TextureFlags::RENDER_WINDOW_SPECIFIC | TextureFlags::NOT_TEXTURE,
        PixelFormatGpu::Bgra8UnormSrgb,
        1,
    );
    let spare = scene.target("spare", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Bgra8UnormSrgb, 1);

    let mut desc = RenderPassDescriptor::new();
    desc.colour[0].target = RenderPassTarget::new(window.clone())
        .with_resolve_texture(spare.clone())
        .with_actions(LoadAction::Clear, StoreAction::MultisampleResolve);
    desc.entries_modified(EntryTypes::COLOUR0).unwrap();

    let target = &desc.colour[0].target;
    assert!(target.resolve_texture.is_none());
    assert_eq!(target.store_action, StoreAction::Store);
    assert!(desc.has_attachment(&window));
    assert!(!desc.has_attachment(&spare));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn windows_cannot_share_a_pass_with_other_colour_targets() {
    let scene = Scene::new();
    let window = scene.target("window", TextureFlags::RENDER_WINDOW_SPECIFIC, PixelFormatGpu::Bgra8UnormSrgb, 1);
    let gbuffer = scene.target("gbuffer", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);

    let mut desc = RenderPassDescriptor::new();
    desc.colour[0].target = RenderPassTarget::new(window);
    desc.colour[1].target = RenderPassTarget::new(gbuffer);
    assert_eq!(
        desc.entries_modified(EntryTypes::COLOUR).unwrap_err().kind(),
        ErrorKind::InvalidParameters
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn plain_textures_cannot_be_colour_targets() {
    let scene = Scene::new();
    let albedo = scene.target("albedo", TextureFlags::empty(), PixelFormatGpu::Rgba8Unorm, 1);
    let mut desc = RenderPassDescriptor::new();
    desc.colour[0].target = RenderPassTarget::new(albedo);
    assert_eq!(
        desc.entries_modified(EntryTypes::ALL).unwrap_err().kind(),
        ErrorKind::InvalidParameters
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn gbuffer_pass_with_shared_depth_stencil() {
    let scene = Scene::new();
    let albedo = scene.target("albedo", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);
    let normals = scene.target("normals", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba16Float, 1);
    let depth = scene.target(
        "depth",
        TextureFlags::RENDER_TO_TEXTURE,
        PixelFormatGpu::D24UnormS8Uint,
        1,
    );

    let mut desc = RenderPassDescriptor::new();
    desc.colour[0].target = RenderPassTarget::new(albedo.clone());
    desc.colour[1].target = RenderPassTarget::new(normals);
    desc.depth.target = RenderPassTarget::new(depth.clone());
    desc.stencil.target = RenderPassTarget::new(depth.clone());
    desc.entries_modified(EntryTypes::ALL).unwrap();

    assert_eq!(desc.num_colour_entries(), 2);
    assert!(desc.colour_targets().iter().all(|c| c.target.store_action == StoreAction::Store));
    assert_eq!(desc.depth.target.store_action, StoreAction::Store);

    let key = FrameBufferDescKey::from(&desc);
    assert_eq!(key.colour().len(), 2);
    assert_eq!(key.depth().map(|d| d.texture), Some(depth.id()));
    assert_eq!(key.stencil().map(|s| s.texture), Some(depth.id()));
    assert_eq!(key.colour()[0].texture, albedo.id());
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn actions_do_not_change_the_framebuffer() {
    let scene = Scene::new();
    let colour = scene.target("colour", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);
    let depth = scene.target("depth", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::D32Float, 1);

    let mut clearing = RenderPassDescriptor::new();
    clearing.colour[0].target = RenderPassTarget::new(colour.clone());
    clearing.colour[0].clear_colour = [0.2, 0.3, 0.4, 1.0];
    clearing.depth.target = RenderPassTarget::new(depth.clone());
    clearing.depth.clear_depth = 0.0;
    clearing.entries_modified(EntryTypes::ALL).unwrap();

    let mut loading = RenderPassDescriptor::new();
    loading.colour[0].target =
        RenderPassTarget::new(colour.clone()).with_actions(LoadAction::Load, StoreAction::Store);
    loading.depth.target =
        RenderPassTarget::new(depth.clone()).with_actions(LoadAction::ClearOnTilers, StoreAction::DontCare);
    loading.entries_modified(EntryTypes::ALL).unwrap();

    assert!(clearing.has_same_attachments(&loading));
    assert_eq!(FrameBufferDescKey::from(&clearing), FrameBufferDescKey::from(&loading));

    let mut read_only = loading.clone();
    read_only.depth.read_only = true;
    read_only.entries_modified(EntryTypes::DEPTH).unwrap();
    assert!(!read_only.has_same_attachments(&loading));
}

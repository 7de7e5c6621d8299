// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Residency transitions executed by a worker thread.
#![cfg(not(target_arch = "wasm32"))]

use std::sync::Arc;

use textures_and_passes::config::ResidencyConfig;
use textures_and_passes::imp::nop::NopBackend;
use textures_and_passes::pixel_formats::PixelFormatGpu;
use textures_and_passes::textures::{
    CodecRegistry, GpuResidency, Image2, ImageLoader, InMemorySource, TextureGpuManager, TextureType,
    TransitionRequest,
};

fn png(width: u32, height: u32, value: u8) -> Vec<u8> {
    let codecs = CodecRegistry::new();
    codecs.init();
    let image = Image2::solid(width, height, PixelFormatGpu::Rgba8Unorm, value).unwrap();
    codecs.codec_for("image.png").unwrap().encode(&image).unwrap()
}

#[test]
fn worker_makes_textures_resident() {
    let backend = NopBackend::new();
    let manager = TextureGpuManager::new(Arc::new(backend.clone()), ResidencyConfig::default());
    let worker = manager.start_worker().unwrap();

    let textures: Vec<_> = (0..8)
        .map(|i| {
            let texture = manager
                .create_texture(&format!("sprite {i}"), Default::default(), TextureType::Type2D)
                .unwrap();
            let image = Arc::new(Image2::solid(16, 16, PixelFormatGpu::Rgba8Unorm, i as u8).unwrap());
            texture
                .schedule_transition_to(TransitionRequest::new(GpuResidency::Resident).with_image(image))
                .unwrap();
            texture
        })
        .collect();

    let waits = futures::future::join_all(textures.iter().map(|t| t.wait_for_data()));
    for result in test_executors::spin_on(waits) {
        result.unwrap();
    }
    for (i, texture) in textures.iter().enumerate() {
        assert_eq!(texture.residency(), GpuResidency::Resident);
        let texels = test_executors::spin_on(texture.copy_contents_to_memory(texture.metadata().mip_box(0), 0))
            .unwrap();
        assert!(texels.iter().all(|&b| b == i as u8));
    }
    assert_eq!(backend.live_textures(), 8);
    worker.stop();
}

#[test]
fn transitions_of_one_texture_run_in_order() {
    let manager = TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default());
    let texture = manager
        .create_texture("ordered", Default::default(), TextureType::Type2D)
        .unwrap();
    let image = Arc::new(Image2::solid(4, 4, PixelFormatGpu::Rgba8Unorm, 0).unwrap());
    texture
        .schedule_transition_to(TransitionRequest::new(GpuResidency::Resident).with_image(image))
        .unwrap();
    texture.schedule_transition_to(GpuResidency::OnStorage).unwrap();
    assert_eq!(texture.pending_transitions(), 2);
    assert_eq!(texture.next_residency(), GpuResidency::OnStorage);

    let worker = manager.start_worker().unwrap();
    test_executors::spin_on(texture.wait_for_data()).unwrap();
    assert_eq!(texture.residency(), GpuResidency::OnStorage);
    assert_eq!(texture.pending_transitions(), 0);
    worker.stop();
}

#[test]
fn multiload_decodes_a_batch_from_the_source() {
    let source = Arc::new(InMemorySource::new());
    let codecs = Arc::new(CodecRegistry::new());
    codecs.init();
    let names: Vec<String> = (0..6).map(|i| format!("tile{i}.png")).collect();
    for (i, name) in names.iter().enumerate() {
        source.insert(name.clone(), png(8 + i as u32, 8, i as u8));
    }
    let manager = TextureGpuManager::with_loader(
        Arc::new(NopBackend::new()),
        ResidencyConfig::default(),
        ImageLoader::new(source, codecs),
    );
    let textures: Vec<_> = names
        .iter()
        .map(|name| {
            let texture = manager.create_texture(name, Default::default(), TextureType::Type2D).unwrap();
            texture.schedule_transition_to(GpuResidency::Resident).unwrap();
            texture
        })
        .collect();
    assert_eq!(manager.pending_requests(), names.len());

    // No worker: waiting drives the queue on this thread.
    manager.wait_for(&textures[5], false).unwrap();
    for (i, texture) in textures.iter().enumerate() {
        assert!(texture.is_data_ready());
        assert_eq!(texture.width(), 8 + i as u32);
    }
}

#[test]
fn stopping_the_worker_leaves_later_work_queued() {
    let manager = TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default());
    let worker = manager.start_worker().unwrap();
    worker.stop();

    let texture = manager
        .create_texture("late", Default::default(), TextureType::Type2D)
        .unwrap();
    let image = Arc::new(Image2::solid(4, 4, PixelFormatGpu::Rgba8Unorm, 0).unwrap());
    texture
        .schedule_transition_to(TransitionRequest::new(GpuResidency::Resident).with_image(image))
        .unwrap();
    assert_eq!(manager.pending_requests(), 1);
    assert_eq!(manager.process_queue(), 1);
    assert!(texture.is_data_ready());
}

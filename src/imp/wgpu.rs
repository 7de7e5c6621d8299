// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! wgpu backend.
//!
//! Wraps a `wgpu::Device` and its queue. Uploads go through
//! `Queue::write_texture`; copies and readbacks are encoded and submitted
//! immediately.

mod pixel_format;
mod texture;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use crate::error::Error;
use crate::imp::{BackendTexture, BackendTextureDesc, GpuTextureBackend};
use crate::pixel_formats::PixelFormatGpu;
use crate::textures::{SampleDescription, TextureFlags, TextureType};

pub use texture::WgpuTexture;

#[derive(Debug)]
pub(crate) struct Submissions {
    pub submitted: AtomicUsize,
    pub completed: Arc<AtomicUsize>,
}

#[derive(Debug)]
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    submissions: Arc<Submissions>,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        WgpuBackend {
            device,
            queue,
            submissions: Arc::new(Submissions {
                submitted: AtomicUsize::new(0),
                completed: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl GpuTextureBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn resolve_sample_description(
        &self,
        requested: SampleDescription,
        pixel_format: PixelFormatGpu,
    ) -> SampleDescription {
        let Some(format) = pixel_format::wgpu_format(pixel_format) else {
            return requested;
        };
        let flags = format.guaranteed_format_features(self.device.features()).flags;
        let supported = [16u8, 8, 4, 2]
            .into_iter()
            .find(|&count| count <= requested.colour_samples() && flags.sample_count_supported(count as u32))
            .unwrap_or(1);
        if supported == requested.colour_samples() {
            requested
        } else {
            SampleDescription::new(supported, requested.pattern())
        }
    }

    fn create_texture(&self, desc: &BackendTextureDesc<'_>) -> Result<Box<dyn BackendTexture>, Error> {
        let format = pixel_format::wgpu_format(desc.pixel_format).ok_or_else(|| {
            Error::NotImplemented(format!("wgpu has no format for {}", desc.pixel_format.name()))
        })?;
        let dimension = match desc.texture_type {
            TextureType::Type1D | TextureType::Type1DArray => wgpu::TextureDimension::D1,
            TextureType::Type3D => wgpu::TextureDimension::D3,
            _ => wgpu::TextureDimension::D2,
        };
        let mut usage = wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST;
        if !desc.flags.contains(TextureFlags::NOT_TEXTURE) {
            usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if desc.flags.contains(TextureFlags::RENDER_TO_TEXTURE) {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        if desc.flags.contains(TextureFlags::UAV) {
            usage |= wgpu::TextureUsages::STORAGE_BINDING;
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.name),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: desc.depth_or_slices,
            },
            mip_level_count: desc.num_mipmaps as u32,
            sample_count: desc.sample_description.colour_samples() as u32,
            dimension,
            format,
            usage,
            view_formats: &[],
        });
        logwise::info_sync!(
            "wgpu: created texture {name}",
            name = logwise::privacy::LogIt(desc.name)
        );
        Ok(Box::new(WgpuTexture::new(
            texture,
            desc.pixel_format,
            self.device.clone(),
            self.queue.clone(),
            self.submissions.clone(),
        )))
    }
}

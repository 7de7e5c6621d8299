// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use wgpu::{Extent3d, TexelCopyBufferLayout, TexelCopyTextureInfo};

use super::Submissions;
use crate::error::Error;
use crate::imp::BackendTexture;
use crate::pixel_formats::PixelFormatGpu;
use crate::textures::{TexelBox, TextureCopy};

/// A texture created by [`WgpuBackend`](super::WgpuBackend).
#[derive(Debug)]
pub struct WgpuTexture {
    texture: wgpu::Texture,
    pixel_format: PixelFormatGpu,
    device: wgpu::Device,
    queue: wgpu::Queue,
    submissions: Arc<Submissions>,
}

fn origin(region: &TexelBox) -> wgpu::Origin3d {
    wgpu::Origin3d {
        x: region.left,
        y: region.top,
        z: region.front,
    }
}

fn extent(region: &TexelBox) -> Extent3d {
    Extent3d {
        width: region.width(),
        height: region.height(),
        depth_or_array_layers: region.depth(),
    }
}

impl WgpuTexture {
    pub(crate) fn new(
        texture: wgpu::Texture,
        pixel_format: PixelFormatGpu,
        device: wgpu::Device,
        queue: wgpu::Queue,
        submissions: Arc<Submissions>,
    ) -> Self {
        WgpuTexture {
            texture,
            pixel_format,
            device,
            queue,
            submissions,
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    fn copy_info(&self, mip_level: u8, region: &TexelBox) -> TexelCopyTextureInfo<'_> {
        TexelCopyTextureInfo {
            texture: &self.texture,
            mip_level: mip_level as u32,
            origin: origin(region),
            aspect: wgpu::TextureAspect::All,
        }
    }

    /// Submits `commands` and counts the submission until the GPU finishes it.
    fn submit(&self, commands: Option<wgpu::CommandBuffer>) {
        self.submissions.submitted.fetch_add(1, Ordering::AcqRel);
        self.queue.submit(commands);
        let completed = self.submissions.completed.clone();
        self.queue.on_submitted_work_done(move || {
            completed.fetch_add(1, Ordering::AcqRel);
        });
    }

    fn poll(&self, poll_type: wgpu::PollType) -> Result<(), Error> {
        self.device
            .poll(poll_type)
            .map(|_| ())
            .map_err(|err| Error::RenderingApi(err.to_string()))
    }
}

impl BackendTexture for WgpuTexture {
    fn upload(&self, mip_level: u8, dst: &TexelBox, data: &[u8], bytes_per_row: usize) -> Result<(), Error> {
        let rows = self.pixel_format.rows(dst.height()) as u32;
        self.queue.write_texture(
            self.copy_info(mip_level, dst),
            data,
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row as u32),
                rows_per_image: Some(rows),
            },
            extent(dst),
        );
        self.submit(None);
        Ok(())
    }

    fn is_data_ready(&self) -> bool {
        if self.poll(wgpu::PollType::Poll).is_err() {
            return false;
        }
        self.submissions.completed.load(Ordering::Acquire) >= self.submissions.submitted.load(Ordering::Acquire)
    }

    fn flush(&self) -> Result<(), Error> {
        self.poll(wgpu::PollType::Wait)
    }

    fn copy_to(&self, dst: &dyn BackendTexture, copy: &TextureCopy) -> Result<(), Error> {
        let dst = dst
            .as_any()
            .downcast_ref::<WgpuTexture>()
            .ok_or_else(|| Error::RenderingApi("wgpu textures only copy into wgpu textures".to_string()))?;
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("texture copy"),
        });
        encoder.copy_texture_to_texture(
            self.copy_info(copy.src_mip(), &copy.src_box()),
            dst.copy_info(copy.dst_mip(), &copy.dst_box()),
            extent(&copy.src_box()),
        );
        self.submit(Some(encoder.finish()));
        Ok(())
    }

    fn read_back(&self, mip_level: u8, src: &TexelBox, bytes_per_row: usize) -> Result<Vec<u8>, Error> {
        let row_len = self.pixel_format.bytes_per_row(src.width(), 1);
        let padded_row = row_len.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize);
        let rows = self.pixel_format.rows(src.height());
        let images = src.depth() as usize;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("texture readback"),
            size: (padded_row * rows * images) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("texture readback"),
        });
        encoder.copy_texture_to_buffer(
            self.copy_info(mip_level, src),
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row as u32),
                    rows_per_image: Some(rows as u32),
                },
            },
            extent(src),
        );
        self.submit(Some(encoder.finish()));

        let (sender, receiver) = std::sync::mpsc::channel();
        buffer.map_async(wgpu::MapMode::Read, .., move |result| {
            let _ = sender.send(result);
        });
        self.poll(wgpu::PollType::Wait)?;
        receiver
            .recv()
            .map_err(|_| Error::RenderingApi("readback mapping was dropped".to_string()))?
            .map_err(|err| Error::RenderingApi(err.to_string()))?;

        let mut out = vec![0; bytes_per_row * rows * images];
        {
            let mapped = buffer.slice(..).get_mapped_range();
            for line in 0..rows * images {
                let src_start = line * padded_row;
                let dst_start = line * bytes_per_row;
                out[dst_start..dst_start + row_len].copy_from_slice(&mapped[src_start..src_start + row_len]);
            }
        }
        buffer.unmap();
        Ok(out)
    }

    fn resolve(&self) -> Result<(), Error> {
        // wgpu resolves inside render passes only
        Err(Error::NotImplemented("standalone resolves on wgpu".to_string()))
    }

    fn generate_mipmaps(&self) -> Result<(), Error> {
        Err(Error::NotImplemented("mipmap generation on wgpu".to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

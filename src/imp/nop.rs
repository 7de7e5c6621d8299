// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A backend that keeps texels in CPU memory.

Nothing is rendered, but every upload, copy and readback moves real bytes, so
residency transitions can be observed end to end. The backend also counts the
storage it creates and destroys and can simulate a GPU that is still busy.
*/

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::imp::{BackendTexture, BackendTextureDesc, GpuTextureBackend};
use crate::pixel_formats::{PixelFormatGpu, SYS_RAM_ROW_ALIGNMENT, mip_extent};
use crate::textures::{SampleDescription, TexelBox, TextureCopy, TextureType};

#[derive(Debug)]
struct NopShared {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    resolves: AtomicUsize,
    mipmap_generations: AtomicUsize,
    gpu_busy: AtomicBool,
    max_samples: AtomicU8,
    tiler: bool,
}

/// CPU-memory backend. Clones share counters and settings.
#[derive(Debug, Clone)]
pub struct NopBackend {
    shared: Arc<NopShared>,
}

impl Default for NopBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NopBackend {
    pub fn new() -> Self {
        Self::with_tiler(false)
    }

    /// A backend that reports itself as a tile-based GPU.
    pub fn new_tiler() -> Self {
        Self::with_tiler(true)
    }

    fn with_tiler(tiler: bool) -> Self {
        NopBackend {
            shared: Arc::new(NopShared {
                created: AtomicUsize::new(0),
                destroyed: AtomicUsize::new(0),
                resolves: AtomicUsize::new(0),
                mipmap_generations: AtomicUsize::new(0),
                gpu_busy: AtomicBool::new(false),
                max_samples: AtomicU8::new(8),
                tiler,
            }),
        }
    }

    /// Pretends submitted work is still executing until the next flush.
    pub fn set_gpu_busy(&self, busy: bool) {
        self.shared.gpu_busy.store(busy, Ordering::Release);
    }

    /// Caps the colour samples textures may use. Larger requests are reduced.
    pub fn set_max_samples(&self, samples: u8) {
        self.shared.max_samples.store(samples.max(1), Ordering::Relaxed);
    }

    pub fn textures_created(&self) -> usize {
        self.shared.created.load(Ordering::Relaxed)
    }

    pub fn textures_destroyed(&self) -> usize {
        self.shared.destroyed.load(Ordering::Relaxed)
    }

    pub fn live_textures(&self) -> usize {
        self.textures_created() - self.textures_destroyed()
    }

    pub fn resolves(&self) -> usize {
        self.shared.resolves.load(Ordering::Relaxed)
    }

    pub fn mipmap_generations(&self) -> usize {
        self.shared.mipmap_generations.load(Ordering::Relaxed)
    }
}

impl GpuTextureBackend for NopBackend {
    fn name(&self) -> &'static str {
        "nop"
    }

    fn is_tiler(&self) -> bool {
        self.shared.tiler
    }

    fn resolve_sample_description(
        &self,
        requested: SampleDescription,
        _pixel_format: PixelFormatGpu,
    ) -> SampleDescription {
        let max = self.shared.max_samples.load(Ordering::Relaxed);
        if requested.colour_samples() > max {
            SampleDescription::new(max, requested.pattern())
        } else {
            requested
        }
    }

    fn create_texture(&self, desc: &BackendTextureDesc<'_>) -> Result<Box<dyn BackendTexture>, Error> {
        let mips = (0..desc.num_mipmaps)
            .map(|mip| {
                let size = desc.pixel_format.size_bytes(
                    mip_extent(desc.width, mip),
                    mip_extent(desc.height, mip),
                    desc.depth_or_slices_at(mip),
                    1,
                    SYS_RAM_ROW_ALIGNMENT,
                );
                vec![0; size]
            })
            .collect();
        self.shared.created.fetch_add(1, Ordering::Relaxed);
        logwise::trace_sync!(
            "nop: created storage for {name}",
            name = logwise::privacy::LogIt(desc.name)
        );
        Ok(Box::new(NopTexture {
            name: desc.name.to_string(),
            width: desc.width,
            height: desc.height,
            depth_or_slices: desc.depth_or_slices,
            texture_type: desc.texture_type,
            pixel_format: desc.pixel_format,
            mips: Mutex::new(mips),
            shared: self.shared.clone(),
        }))
    }
}

/// Storage created by [`NopBackend`].
///
/// Each mip is stored image after image with rows padded to
/// [`SYS_RAM_ROW_ALIGNMENT`].
#[derive(Debug)]
pub struct NopTexture {
    name: String,
    width: u32,
    height: u32,
    depth_or_slices: u32,
    texture_type: TextureType,
    pixel_format: PixelFormatGpu,
    mips: Mutex<Vec<Vec<u8>>>,
    shared: Arc<NopShared>,
}

/// Byte layout of a box inside one mip.
struct Span {
    row_offset: usize,
    row_len: usize,
    first_row: usize,
    rows: usize,
    stored_bytes_per_row: usize,
    stored_rows: usize,
}

impl NopTexture {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn span(&self, mip_level: u8, region: &TexelBox) -> Result<Span, Error> {
        let format = self.pixel_format;
        if format.is_planar_yuv() {
            return Err(Error::NotImplemented(format!(
                "nop backend cannot address texels of {}",
                format.name()
            )));
        }
        let mips = self.mips.lock().expect("Failed to lock mips");
        if mip_level as usize >= mips.len() {
            return Err(Error::invalid_parameters(format!(
                "{} has no mip {mip_level}",
                self.name
            )));
        }
        drop(mips);
        let width = mip_extent(self.width, mip_level);
        let height = mip_extent(self.height, mip_level);
        let depth = if self.texture_type.has_slices() {
            self.depth_or_slices
        } else {
            mip_extent(self.depth_or_slices, mip_level)
        };
        if !TexelBox::full(width, height, depth).contains(region) {
            return Err(Error::invalid_parameters(format!(
                "region {region:?} exceeds mip {mip_level} of {}",
                self.name
            )));
        }
        let row_offset = format.bytes_per_row(region.left, 1);
        let (_, bh) = format.block_dimensions();
        let first_row = (region.top / bh) as usize;
        Ok(Span {
            row_offset,
            row_len: format.bytes_per_row(region.right, 1) - row_offset,
            first_row,
            rows: format.rows(region.bottom) - first_row,
            stored_bytes_per_row: format.bytes_per_row(width, SYS_RAM_ROW_ALIGNMENT),
            stored_rows: format.rows(height),
        })
    }

    fn read_region(&self, mip_level: u8, region: &TexelBox, bytes_per_row: usize) -> Result<Vec<u8>, Error> {
        let span = self.span(mip_level, region)?;
        if bytes_per_row < span.row_len {
            return Err(Error::invalid_parameters("bytes_per_row is smaller than a row of the region"));
        }
        let mips = self.mips.lock().expect("Failed to lock mips");
        let stored = &mips[mip_level as usize];
        let mut out = vec![0; bytes_per_row * span.rows * region.depth() as usize];
        let mut cursor = 0;
        for z in region.front..region.back {
            let image_start = z as usize * span.stored_rows * span.stored_bytes_per_row;
            for row in 0..span.rows {
                let start = image_start + (span.first_row + row) * span.stored_bytes_per_row + span.row_offset;
                out[cursor..cursor + span.row_len].copy_from_slice(&stored[start..start + span.row_len]);
                cursor += bytes_per_row;
            }
        }
        Ok(out)
    }

    fn write_region(&self, mip_level: u8, region: &TexelBox, data: &[u8], bytes_per_row: usize) -> Result<(), Error> {
        let span = self.span(mip_level, region)?;
        let images = region.depth() as usize * span.rows;
        if bytes_per_row < span.row_len || (images > 0 && data.len() < (images - 1) * bytes_per_row + span.row_len) {
            return Err(Error::invalid_parameters(format!(
                "{} bytes do not cover the region at {bytes_per_row} bytes per row",
                data.len()
            )));
        }
        let mut mips = self.mips.lock().expect("Failed to lock mips");
        let stored = &mut mips[mip_level as usize];
        let mut cursor = 0;
        for z in region.front..region.back {
            let image_start = z as usize * span.stored_rows * span.stored_bytes_per_row;
            for row in 0..span.rows {
                let start = image_start + (span.first_row + row) * span.stored_bytes_per_row + span.row_offset;
                stored[start..start + span.row_len].copy_from_slice(&data[cursor..cursor + span.row_len]);
                cursor += bytes_per_row;
            }
        }
        Ok(())
    }
}

impl BackendTexture for NopTexture {
    fn upload(&self, mip_level: u8, dst: &TexelBox, data: &[u8], bytes_per_row: usize) -> Result<(), Error> {
        self.write_region(mip_level, dst, data, bytes_per_row)
    }

    fn is_data_ready(&self) -> bool {
        !self.shared.gpu_busy.load(Ordering::Acquire)
    }

    fn flush(&self) -> Result<(), Error> {
        // waiting for the simulated GPU completes its work
        self.shared.gpu_busy.store(false, Ordering::Release);
        Ok(())
    }

    fn copy_to(&self, dst: &dyn BackendTexture, copy: &TextureCopy) -> Result<(), Error> {
        let dst = dst
            .as_any()
            .downcast_ref::<NopTexture>()
            .ok_or_else(|| Error::RenderingApi("nop textures only copy into nop textures".to_string()))?;
        let src_box = copy.src_box();
        let row_len = self.span(copy.src_mip(), &src_box)?.row_len;
        // read fully before writing so a texture copying into itself never holds two locks
        let texels = self.read_region(copy.src_mip(), &src_box, row_len)?;
        dst.write_region(copy.dst_mip(), &copy.dst_box(), &texels, row_len)
    }

    fn read_back(&self, mip_level: u8, src: &TexelBox, bytes_per_row: usize) -> Result<Vec<u8>, Error> {
        self.read_region(mip_level, src, bytes_per_row)
    }

    fn resolve(&self) -> Result<(), Error> {
        self.shared.resolves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn generate_mipmaps(&self) -> Result<(), Error> {
        self.shared.mipmap_generations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for NopTexture {
    fn drop(&mut self) {
        self.shared.destroyed.fetch_add(1, Ordering::Relaxed);
    }
}

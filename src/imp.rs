// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Backend abstraction for GPU texture storage.

A [`TextureGpu`](crate::textures::TextureGpu) holds no native resources itself.
When it becomes resident it asks the manager's [`GpuTextureBackend`] for a
[`BackendTexture`], and when it leaves residency it drops that handle. Both
happen exactly once per transition.

Two backends ship with the crate:

* [`nop::NopBackend`] keeps texels in CPU memory. It is always compiled and is
  what the tests run against.
* `wgpu::WgpuBackend` (feature `backend_wgpu`) wraps a `wgpu::Device`.
*/

use std::any::Any;
use std::fmt::Debug;

use crate::error::Error;
use crate::pixel_formats::PixelFormatGpu;
use crate::textures::{SampleDescription, TexelBox, TextureCopy, TextureFlags, TextureType};

pub mod nop;

#[cfg(all(feature = "backend_wgpu", any(not(target_arch = "wasm32"), feature = "wgpu_webgl")))]
pub mod wgpu;

/// Everything a backend needs to create storage for a texture.
#[derive(Debug, Clone, Copy)]
pub struct BackendTextureDesc<'a> {
    pub name: &'a str,
    pub width: u32,
    pub height: u32,
    pub depth_or_slices: u32,
    pub num_mipmaps: u8,
    pub texture_type: TextureType,
    pub pixel_format: PixelFormatGpu,
    pub sample_description: SampleDescription,
    pub flags: TextureFlags,
}

impl BackendTextureDesc<'_> {
    /// Depth of `mip`; array slices do not shrink with the mip chain.
    pub fn depth_or_slices_at(&self, mip: u8) -> u32 {
        if self.texture_type.has_slices() {
            self.depth_or_slices
        } else {
            crate::pixel_formats::mip_extent(self.depth_or_slices, mip)
        }
    }
}

/// Creates native texture storage.
pub trait GpuTextureBackend: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Tile-based GPUs treat [`LoadAction::ClearOnTilers`](crate::passes::LoadAction::ClearOnTilers) as a clear.
    fn is_tiler(&self) -> bool {
        false
    }

    /// The sample description the backend will actually use for `requested`.
    fn resolve_sample_description(
        &self,
        requested: SampleDescription,
        _pixel_format: PixelFormatGpu,
    ) -> SampleDescription {
        requested
    }

    fn create_texture(&self, desc: &BackendTextureDesc<'_>) -> Result<Box<dyn BackendTexture>, Error>;
}

/// Native storage of one resident texture (or one texture pool).
///
/// Dropping the handle releases the native resources.
pub trait BackendTexture: Send + Sync + Debug {
    /// Writes `data` into `dst` of `mip_level`. `data` holds rows of `bytes_per_row`
    /// bytes, one image per z entry of `dst`.
    fn upload(&self, mip_level: u8, dst: &TexelBox, data: &[u8], bytes_per_row: usize) -> Result<(), Error>;

    /// Whether every upload and copy submitted so far has completed.
    fn is_data_ready(&self) -> bool;

    /// Blocks until [`BackendTexture::is_data_ready`] would return true.
    fn flush(&self) -> Result<(), Error>;

    /// Copies a region into `dst`. Boxes in `copy` are already offset to the
    /// slices each texture occupies in its storage.
    fn copy_to(&self, dst: &dyn BackendTexture, copy: &TextureCopy) -> Result<(), Error>;

    /// Reads `src` of `mip_level` back to the CPU, rows padded to `bytes_per_row`.
    fn read_back(&self, mip_level: u8, src: &TexelBox, bytes_per_row: usize) -> Result<Vec<u8>, Error>;

    /// Resolves a multisampled texture into its implicit resolve target.
    fn resolve(&self) -> Result<(), Error>;

    fn generate_mipmaps(&self) -> Result<(), Error>;

    fn as_any(&self) -> &dyn Any;
}

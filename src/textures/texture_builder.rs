// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Builder pattern for texture creation.

use std::sync::Arc;

use crate::error::Error;
use crate::pixel_formats::PixelFormatGpu;

use super::{GpuPageOutStrategy, SampleDescription, TextureFlags, TextureGpu, TextureGpuManager, TextureType};

/// Builder for creating textures with a cleaner API than long parameter lists.
///
/// Obtained from [`TextureGpuManager::texture`]. Metadata set here is applied
/// while the texture is still on storage. Textures that load their contents
/// from a source can leave it unset; the loaded image provides it.
#[derive(Debug)]
pub struct TextureGpuBuilder<'a> {
    manager: &'a TextureGpuManager,
    name: &'a str,
    texture_type: TextureType,
    flags: TextureFlags,
    page_out_strategy: Option<GpuPageOutStrategy>,
    resolution: Option<(u32, u32, u32)>,
    pixel_format: Option<PixelFormatGpu>,
    num_mipmaps: Option<u8>,
    sample_description: Option<SampleDescription>,
}

impl<'a> TextureGpuBuilder<'a> {
    pub(crate) fn new(manager: &'a TextureGpuManager, name: &'a str, texture_type: TextureType) -> Self {
        Self {
            manager,
            name,
            texture_type,
            flags: TextureFlags::empty(),
            page_out_strategy: None,
            resolution: None,
            pixel_format: None,
            num_mipmaps: None,
            sample_description: None,
        }
    }

    pub fn with_flags(mut self, flags: TextureFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Overrides the manager's default page-out strategy.
    pub fn with_page_out_strategy(mut self, strategy: GpuPageOutStrategy) -> Self {
        self.page_out_strategy = Some(strategy);
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32, depth_or_slices: u32) -> Self {
        self.resolution = Some((width, height, depth_or_slices));
        self
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormatGpu) -> Self {
        self.pixel_format = Some(pixel_format);
        self
    }

    pub fn with_num_mipmaps(mut self, num_mipmaps: u8) -> Self {
        self.num_mipmaps = Some(num_mipmaps);
        self
    }

    pub fn with_sample_description(mut self, sample_description: SampleDescription) -> Self {
        self.sample_description = Some(sample_description);
        self
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    pub fn flags(&self) -> TextureFlags {
        self.flags
    }

    pub fn page_out_strategy(&self) -> Option<GpuPageOutStrategy> {
        self.page_out_strategy
    }

    /// Creates and registers the texture.
    ///
    /// Fails with [`Error::InvalidParameters`] when the name is taken or a
    /// metadata value is rejected. A rejected texture is not registered.
    pub fn build(self) -> Result<Arc<TextureGpu>, Error> {
        let texture = self
            .manager
            .register(self.name, self.flags, self.texture_type, self.page_out_strategy)?;
        let applied = (|| {
            if let Some((width, height, depth_or_slices)) = self.resolution {
                texture.set_resolution(width, height, depth_or_slices)?;
            }
            if let Some(pixel_format) = self.pixel_format {
                texture.set_pixel_format(pixel_format)?;
            }
            if let Some(num_mipmaps) = self.num_mipmaps {
                texture.set_num_mipmaps(num_mipmaps)?;
            }
            if let Some(sample_description) = self.sample_description {
                texture.set_sample_description(sample_description)?;
            }
            Ok(())
        })();
        match applied {
            Ok(()) => Ok(texture),
            Err(err) => {
                self.manager.destroy_texture(&texture)?;
                Err(err)
            }
        }
    }
}

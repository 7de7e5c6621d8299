// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Texture pools for automatic batching.
//!
//! Textures flagged [`TextureFlags::AUTOMATIC_BATCHING`](super::TextureFlags::AUTOMATIC_BATCHING)
//! do not get storage of their own. They share a 2D array texture (the pool
//! master) with other textures of the same extent, format and mip count, each
//! occupying one slice.

use std::sync::Arc;

use crate::pixel_formats::PixelFormatGpu;

use super::{TextureGpu, TextureId};

/// Identity of a texture pool within its manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub(crate) u32);

impl PoolId {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// A snapshot of one pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexturePoolInfo {
    pub id: PoolId,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormatGpu,
    pub num_mipmaps: u8,
    pub slices: u16,
    pub used_slices: u16,
}

#[derive(Debug)]
pub(crate) struct TexturePool {
    id: PoolId,
    master: Arc<TextureGpu>,
    width: u32,
    height: u32,
    pixel_format: PixelFormatGpu,
    num_mipmaps: u8,
    slots: Vec<Option<TextureId>>,
}

impl TexturePool {
    pub fn new(
        id: PoolId,
        master: Arc<TextureGpu>,
        width: u32,
        height: u32,
        pixel_format: PixelFormatGpu,
        num_mipmaps: u8,
        slices: u16,
    ) -> Self {
        TexturePool {
            id,
            master,
            width,
            height,
            pixel_format,
            num_mipmaps,
            slots: vec![None; slices as usize],
        }
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn master(&self) -> &Arc<TextureGpu> {
        &self.master
    }

    pub fn accepts(&self, width: u32, height: u32, pixel_format: PixelFormatGpu, num_mipmaps: u8) -> bool {
        self.width == width
            && self.height == height
            && self.pixel_format == pixel_format
            && self.num_mipmaps == num_mipmaps
            && self.slots.iter().any(Option::is_none)
    }

    /// Claims the lowest free slice for `texture`.
    pub fn reserve(&mut self, texture: TextureId) -> Option<u16> {
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(texture);
        Some(index as u16)
    }

    /// Frees `slice`. Returns whether the pool is now empty.
    pub fn release(&mut self, slice: u16) -> bool {
        if let Some(slot) = self.slots.get_mut(slice as usize) {
            *slot = None;
        }
        self.slots.iter().all(Option::is_none)
    }

    pub fn info(&self) -> TexturePoolInfo {
        TexturePoolInfo {
            id: self.id,
            width: self.width,
            height: self.height,
            pixel_format: self.pixel_format,
            num_mipmaps: self.num_mipmaps,
            slices: self.slots.len() as u16,
            used_slices: self.slots.iter().filter(|s| s.is_some()).count() as u16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textures::{GpuPageOutStrategy, TextureFlags, TextureType};
    use std::sync::Weak;

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn slices_are_reused_lowest_first() {
        let master = Arc::new(TextureGpu::new(
            "pool".to_string(),
            TextureFlags::POOL_OWNER,
            TextureType::Type2DArray,
            GpuPageOutStrategy::Discard,
            Weak::new(),
        ));
        let mut pool = TexturePool::new(PoolId(1), master, 32, 32, PixelFormatGpu::Rgba8Unorm, 1, 2);
        let a = TextureId(100);
        let b = TextureId(101);
        assert!(pool.accepts(32, 32, PixelFormatGpu::Rgba8Unorm, 1));
        assert!(!pool.accepts(64, 32, PixelFormatGpu::Rgba8Unorm, 1));
        assert_eq!(pool.reserve(a), Some(0));
        assert_eq!(pool.reserve(b), Some(1));
        assert_eq!(pool.reserve(TextureId(102)), None);
        assert!(!pool.accepts(32, 32, PixelFormatGpu::Rgba8Unorm, 1));
        assert!(!pool.release(0));
        assert_eq!(pool.info().used_slices, 1);
        assert_eq!(pool.reserve(TextureId(103)), Some(0));
        assert!(!pool.release(1));
        assert!(pool.release(0));
    }
}

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Pixel format definitions for GPU textures.
//!
//! [`PixelFormatGpu`] is a closed enumeration of the formats a texture may be
//! created with. Each format encodes:
//!
//! - Number of components
//! - Data type per component (normalized, integer, half, float)
//! - Color space (linear or sRGB)
//! - Whether the format carries depth and/or stencil
//! - Block layout for compressed formats, plane layout for planar YUV formats
//!
//! # Design Philosophy
//!
//! Formats are runtime values rather than zero-sized types. A texture learns its
//! format only after its image has been decoded on a worker thread, so the
//! format has to be data that can be compared, stored in a metadata cache and
//! reinterpreted by descriptor sets.
//!
//! # Examples
//!
//! ```
//! use textures_and_passes::pixel_formats::PixelFormatGpu;
//!
//! let format = PixelFormatGpu::Rgba8UnormSrgb;
//! assert!(format.is_srgb());
//! assert_eq!(format.equivalent_linear(), PixelFormatGpu::Rgba8Unorm);
//! assert_eq!(format.size_bytes(256, 256, 1, 1, 4), 256 * 256 * 4);
//! ```

pub mod png_support;

/// Row alignment, in bytes, of system RAM copies and decoded images.
pub const SYS_RAM_ROW_ALIGNMENT: usize = 4;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct FormatFlags: u16 {
        const FLOAT = 1 << 0;
        const HALF = 1 << 1;
        const INTEGER = 1 << 2;
        const NORMALIZED = 1 << 3;
        const SIGNED = 1 << 4;
        const DEPTH = 1 << 5;
        const STENCIL = 1 << 6;
        const SRGB = 1 << 7;
        const COMPRESSED = 1 << 8;
        const ALPHA = 1 << 9;
        const PLANAR_YUV = 1 << 10;
        // Packed formats with a shared exponent or unusual bit widths.
        const FLOAT_RARE = 1 << 11;
    }
}

#[derive(Debug, Clone, Copy)]
struct FormatDesc {
    name: &'static str,
    components: u8,
    // Zero for compressed and planar formats.
    bytes_per_pixel: u8,
    flags: FormatFlags,
}

const fn desc(name: &'static str, components: u8, bytes_per_pixel: u8, flags: FormatFlags) -> FormatDesc {
    FormatDesc {
        name,
        components,
        bytes_per_pixel,
        flags,
    }
}

/// A GPU pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PixelFormatGpu {
    #[default]
    Unknown,
    /// Render targets without colour storage.
    Null,
    Rgba32Float,
    Rgba32Uint,
    Rgba32Sint,
    Rgb32Float,
    Rgb32Uint,
    Rgb32Sint,
    Rgba16Float,
    Rgba16Unorm,
    Rgba16Uint,
    Rgba16Snorm,
    Rgba16Sint,
    Rg32Float,
    Rg32Uint,
    Rg32Sint,
    D32FloatS8X24Uint,
    R10G10B10A2Unorm,
    R10G10B10A2Uint,
    R11G11B10Float,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Rgba8Uint,
    Rgba8Snorm,
    Rgba8Sint,
    Rg16Float,
    Rg16Unorm,
    Rg16Uint,
    Rg16Snorm,
    Rg16Sint,
    D32Float,
    R32Float,
    R32Uint,
    R32Sint,
    D24UnormS8Uint,
    D24Unorm,
    Rg8Unorm,
    Rg8Uint,
    Rg8Snorm,
    Rg8Sint,
    R16Float,
    D16Unorm,
    R16Unorm,
    R16Uint,
    R16Snorm,
    R16Sint,
    R8Unorm,
    R8Uint,
    R8Snorm,
    R8Sint,
    A8Unorm,
    R9G9B9E5SharedExp,
    B5G6R5Unorm,
    B5G5R5A1Unorm,
    Bgra8Unorm,
    Bgrx8Unorm,
    Bgra8UnormSrgb,
    Bgrx8UnormSrgb,
    B4G4R4A4Unorm,
    Bc1Unorm,
    Bc1UnormSrgb,
    Bc2Unorm,
    Bc2UnormSrgb,
    Bc3Unorm,
    Bc3UnormSrgb,
    Bc4Unorm,
    Bc4Snorm,
    Bc5Unorm,
    Bc5Snorm,
    Bc6hUf16,
    Bc6hSf16,
    Bc7Unorm,
    Bc7UnormSrgb,
    Etc2Rgb8Unorm,
    Etc2Rgb8UnormSrgb,
    Etc2Rgb8A1Unorm,
    Etc2Rgb8A1UnormSrgb,
    Etc2Rgba8Unorm,
    Etc2Rgba8UnormSrgb,
    Astc4x4Unorm,
    Astc4x4UnormSrgb,
    Astc6x6Unorm,
    Astc6x6UnormSrgb,
    Astc8x8Unorm,
    Astc8x8UnormSrgb,
    /// Packed 4:2:2 YUV, two pixels per four bytes.
    Yuy2,
    /// Planar 4:2:0 YUV, 8 bits per sample.
    Nv12,
    /// Planar 4:2:0 YUV, 10 bits per sample stored in 16.
    P010,
}

impl PixelFormatGpu {
    fn desc(self) -> FormatDesc {
        use FormatFlags as F;
        use PixelFormatGpu::*;
        let unorm = F::NORMALIZED;
        let snorm = F::NORMALIZED.union(F::SIGNED);
        let uint = F::INTEGER;
        let sint = F::INTEGER.union(F::SIGNED);
        let float = F::FLOAT.union(F::SIGNED);
        let half = F::HALF.union(F::SIGNED);
        let a = F::ALPHA;
        let srgb = F::SRGB;
        let bc = F::COMPRESSED;
        match self {
            Unknown => desc("Unknown", 0, 0, F::empty()),
            Null => desc("Null", 0, 0, F::empty()),
            Rgba32Float => desc("Rgba32Float", 4, 16, float.union(a)),
            Rgba32Uint => desc("Rgba32Uint", 4, 16, uint.union(a)),
            Rgba32Sint => desc("Rgba32Sint", 4, 16, sint.union(a)),
            Rgb32Float => desc("Rgb32Float", 3, 12, float),
            Rgb32Uint => desc("Rgb32Uint", 3, 12, uint),
            Rgb32Sint => desc("Rgb32Sint", 3, 12, sint),
            Rgba16Float => desc("Rgba16Float", 4, 8, half.union(a)),
            Rgba16Unorm => desc("Rgba16Unorm", 4, 8, unorm.union(a)),
            Rgba16Uint => desc("Rgba16Uint", 4, 8, uint.union(a)),
            Rgba16Snorm => desc("Rgba16Snorm", 4, 8, snorm.union(a)),
            Rgba16Sint => desc("Rgba16Sint", 4, 8, sint.union(a)),
            Rg32Float => desc("Rg32Float", 2, 8, float),
            Rg32Uint => desc("Rg32Uint", 2, 8, uint),
            Rg32Sint => desc("Rg32Sint", 2, 8, sint),
            D32FloatS8X24Uint => desc(
                "D32FloatS8X24Uint",
                2,
                8,
                F::FLOAT.union(F::DEPTH).union(F::STENCIL),
            ),
            R10G10B10A2Unorm => desc("R10G10B10A2Unorm", 4, 4, unorm.union(a)),
            R10G10B10A2Uint => desc("R10G10B10A2Uint", 4, 4, uint.union(a)),
            R11G11B10Float => desc("R11G11B10Float", 3, 4, F::FLOAT_RARE),
            Rgba8Unorm => desc("Rgba8Unorm", 4, 4, unorm.union(a)),
            Rgba8UnormSrgb => desc("Rgba8UnormSrgb", 4, 4, unorm.union(a).union(srgb)),
            Rgba8Uint => desc("Rgba8Uint", 4, 4, uint.union(a)),
            Rgba8Snorm => desc("Rgba8Snorm", 4, 4, snorm.union(a)),
            Rgba8Sint => desc("Rgba8Sint", 4, 4, sint.union(a)),
            Rg16Float => desc("Rg16Float", 2, 4, half),
            Rg16Unorm => desc("Rg16Unorm", 2, 4, unorm),
            Rg16Uint => desc("Rg16Uint", 2, 4, uint),
            Rg16Snorm => desc("Rg16Snorm", 2, 4, snorm),
            Rg16Sint => desc("Rg16Sint", 2, 4, sint),
            D32Float => desc("D32Float", 1, 4, F::FLOAT.union(F::DEPTH)),
            R32Float => desc("R32Float", 1, 4, float),
            R32Uint => desc("R32Uint", 1, 4, uint),
            R32Sint => desc("R32Sint", 1, 4, sint),
            D24UnormS8Uint => desc(
                "D24UnormS8Uint",
                2,
                4,
                unorm.union(F::DEPTH).union(F::STENCIL),
            ),
            D24Unorm => desc("D24Unorm", 1, 4, unorm.union(F::DEPTH)),
            Rg8Unorm => desc("Rg8Unorm", 2, 2, unorm),
            Rg8Uint => desc("Rg8Uint", 2, 2, uint),
            Rg8Snorm => desc("Rg8Snorm", 2, 2, snorm),
            Rg8Sint => desc("Rg8Sint", 2, 2, sint),
            R16Float => desc("R16Float", 1, 2, half),
            D16Unorm => desc("D16Unorm", 1, 2, unorm.union(F::DEPTH)),
            R16Unorm => desc("R16Unorm", 1, 2, unorm),
            R16Uint => desc("R16Uint", 1, 2, uint),
            R16Snorm => desc("R16Snorm", 1, 2, snorm),
            R16Sint => desc("R16Sint", 1, 2, sint),
            R8Unorm => desc("R8Unorm", 1, 1, unorm),
            R8Uint => desc("R8Uint", 1, 1, uint),
            R8Snorm => desc("R8Snorm", 1, 1, snorm),
            R8Sint => desc("R8Sint", 1, 1, sint),
            A8Unorm => desc("A8Unorm", 1, 1, unorm.union(a)),
            R9G9B9E5SharedExp => desc("R9G9B9E5SharedExp", 3, 4, F::FLOAT_RARE),
            B5G6R5Unorm => desc("B5G6R5Unorm", 3, 2, unorm),
            B5G5R5A1Unorm => desc("B5G5R5A1Unorm", 4, 2, unorm.union(a)),
            Bgra8Unorm => desc("Bgra8Unorm", 4, 4, unorm.union(a)),
            Bgrx8Unorm => desc("Bgrx8Unorm", 3, 4, unorm),
            Bgra8UnormSrgb => desc("Bgra8UnormSrgb", 4, 4, unorm.union(a).union(srgb)),
            Bgrx8UnormSrgb => desc("Bgrx8UnormSrgb", 3, 4, unorm.union(srgb)),
            B4G4R4A4Unorm => desc("B4G4R4A4Unorm", 4, 2, unorm.union(a)),
            Bc1Unorm => desc("Bc1Unorm", 4, 0, bc.union(unorm).union(a)),
            Bc1UnormSrgb => desc("Bc1UnormSrgb", 4, 0, bc.union(unorm).union(a).union(srgb)),
            Bc2Unorm => desc("Bc2Unorm", 4, 0, bc.union(unorm).union(a)),
            Bc2UnormSrgb => desc("Bc2UnormSrgb", 4, 0, bc.union(unorm).union(a).union(srgb)),
            Bc3Unorm => desc("Bc3Unorm", 4, 0, bc.union(unorm).union(a)),
            Bc3UnormSrgb => desc("Bc3UnormSrgb", 4, 0, bc.union(unorm).union(a).union(srgb)),
            Bc4Unorm => desc("Bc4Unorm", 1, 0, bc.union(unorm)),
            Bc4Snorm => desc("Bc4Snorm", 1, 0, bc.union(snorm)),
            Bc5Unorm => desc("Bc5Unorm", 2, 0, bc.union(unorm)),
            Bc5Snorm => desc("Bc5Snorm", 2, 0, bc.union(snorm)),
            Bc6hUf16 => desc("Bc6hUf16", 3, 0, bc.union(F::HALF)),
            Bc6hSf16 => desc("Bc6hSf16", 3, 0, bc.union(half)),
            Bc7Unorm => desc("Bc7Unorm", 4, 0, bc.union(unorm).union(a)),
            Bc7UnormSrgb => desc("Bc7UnormSrgb", 4, 0, bc.union(unorm).union(a).union(srgb)),
            Etc2Rgb8Unorm => desc("Etc2Rgb8Unorm", 3, 0, bc.union(unorm)),
            Etc2Rgb8UnormSrgb => desc("Etc2Rgb8UnormSrgb", 3, 0, bc.union(unorm).union(srgb)),
            Etc2Rgb8A1Unorm => desc("Etc2Rgb8A1Unorm", 4, 0, bc.union(unorm).union(a)),
            Etc2Rgb8A1UnormSrgb => desc(
                "Etc2Rgb8A1UnormSrgb",
                4,
                0,
                bc.union(unorm).union(a).union(srgb),
            ),
            Etc2Rgba8Unorm => desc("Etc2Rgba8Unorm", 4, 0, bc.union(unorm).union(a)),
            Etc2Rgba8UnormSrgb => desc(
                "Etc2Rgba8UnormSrgb",
                4,
                0,
                bc.union(unorm).union(a).union(srgb),
            ),
            Astc4x4Unorm => desc("Astc4x4Unorm", 4, 0, bc.union(unorm).union(a)),
            Astc4x4UnormSrgb => desc("Astc4x4UnormSrgb", 4, 0, bc.union(unorm).union(a).union(srgb)),
            Astc6x6Unorm => desc("Astc6x6Unorm", 4, 0, bc.union(unorm).union(a)),
            Astc6x6UnormSrgb => desc("Astc6x6UnormSrgb", 4, 0, bc.union(unorm).union(a).union(srgb)),
            Astc8x8Unorm => desc("Astc8x8Unorm", 4, 0, bc.union(unorm).union(a)),
            Astc8x8UnormSrgb => desc("Astc8x8UnormSrgb", 4, 0, bc.union(unorm).union(a).union(srgb)),
            Yuy2 => desc("Yuy2", 3, 2, unorm),
            Nv12 => desc("Nv12", 3, 0, unorm.union(F::PLANAR_YUV)),
            P010 => desc("P010", 3, 0, unorm.union(F::PLANAR_YUV)),
        }
    }

    /// A stable, human-readable name.
    pub fn name(self) -> &'static str {
        self.desc().name
    }

    pub fn components(self) -> u8 {
        self.desc().components
    }

    /// Bytes per pixel for uncompressed formats, zero for compressed and planar ones.
    pub fn bytes_per_pixel(self) -> u8 {
        self.desc().bytes_per_pixel
    }

    pub fn is_depth(self) -> bool {
        self.desc().flags.contains(FormatFlags::DEPTH)
    }

    pub fn is_stencil(self) -> bool {
        self.desc().flags.contains(FormatFlags::STENCIL)
    }

    pub fn is_srgb(self) -> bool {
        self.desc().flags.contains(FormatFlags::SRGB)
    }

    pub fn is_compressed(self) -> bool {
        self.desc().flags.contains(FormatFlags::COMPRESSED)
    }

    pub fn is_planar_yuv(self) -> bool {
        self.desc().flags.contains(FormatFlags::PLANAR_YUV)
    }

    pub fn is_float(self) -> bool {
        self.desc().flags.contains(FormatFlags::FLOAT)
    }

    pub fn is_half(self) -> bool {
        self.desc().flags.contains(FormatFlags::HALF)
    }

    pub fn is_float_rare(self) -> bool {
        self.desc().flags.contains(FormatFlags::FLOAT_RARE)
    }

    pub fn is_integer(self) -> bool {
        self.desc().flags.contains(FormatFlags::INTEGER)
    }

    pub fn is_signed(self) -> bool {
        self.desc().flags.contains(FormatFlags::SIGNED)
    }

    pub fn is_normalized(self) -> bool {
        self.desc().flags.contains(FormatFlags::NORMALIZED)
    }

    pub fn has_alpha(self) -> bool {
        self.desc().flags.contains(FormatFlags::ALPHA)
    }

    /// Dimensions in texels of one compressed block; `(1, 1)` for uncompressed formats.
    pub fn block_dimensions(self) -> (u32, u32) {
        use PixelFormatGpu::*;
        match self {
            Astc6x6Unorm | Astc6x6UnormSrgb => (6, 6),
            Astc8x8Unorm | Astc8x8UnormSrgb => (8, 8),
            f if f.is_compressed() => (4, 4),
            _ => (1, 1),
        }
    }

    /// Bytes of one compressed block; zero for uncompressed formats.
    pub fn block_size_bytes(self) -> u8 {
        use PixelFormatGpu::*;
        match self {
            Bc1Unorm | Bc1UnormSrgb | Bc4Unorm | Bc4Snorm => 8,
            Etc2Rgb8Unorm | Etc2Rgb8UnormSrgb | Etc2Rgb8A1Unorm | Etc2Rgb8A1UnormSrgb => 8,
            f if f.is_compressed() => 16,
            _ => 0,
        }
    }

    /// The linear counterpart of an sRGB format. Linear formats map to themselves.
    pub fn equivalent_linear(self) -> PixelFormatGpu {
        use PixelFormatGpu::*;
        match self {
            Rgba8UnormSrgb => Rgba8Unorm,
            Bgra8UnormSrgb => Bgra8Unorm,
            Bgrx8UnormSrgb => Bgrx8Unorm,
            Bc1UnormSrgb => Bc1Unorm,
            Bc2UnormSrgb => Bc2Unorm,
            Bc3UnormSrgb => Bc3Unorm,
            Bc7UnormSrgb => Bc7Unorm,
            Etc2Rgb8UnormSrgb => Etc2Rgb8Unorm,
            Etc2Rgb8A1UnormSrgb => Etc2Rgb8A1Unorm,
            Etc2Rgba8UnormSrgb => Etc2Rgba8Unorm,
            Astc4x4UnormSrgb => Astc4x4Unorm,
            Astc6x6UnormSrgb => Astc6x6Unorm,
            Astc8x8UnormSrgb => Astc8x8Unorm,
            other => other,
        }
    }

    /// The sRGB counterpart of a linear format, or the format itself when none exists.
    pub fn equivalent_srgb(self) -> PixelFormatGpu {
        use PixelFormatGpu::*;
        match self {
            Rgba8Unorm => Rgba8UnormSrgb,
            Bgra8Unorm => Bgra8UnormSrgb,
            Bgrx8Unorm => Bgrx8UnormSrgb,
            Bc1Unorm => Bc1UnormSrgb,
            Bc2Unorm => Bc2UnormSrgb,
            Bc3Unorm => Bc3UnormSrgb,
            Bc7Unorm => Bc7UnormSrgb,
            Etc2Rgb8Unorm => Etc2Rgb8UnormSrgb,
            Etc2Rgb8A1Unorm => Etc2Rgb8A1UnormSrgb,
            Etc2Rgba8Unorm => Etc2Rgba8UnormSrgb,
            Astc4x4Unorm => Astc4x4UnormSrgb,
            Astc6x6Unorm => Astc6x6UnormSrgb,
            Astc8x8Unorm => Astc8x8UnormSrgb,
            other => other,
        }
    }

    /// Whether texels can be copied between textures of the two formats without conversion.
    pub fn is_copy_compatible(self, other: PixelFormatGpu) -> bool {
        if self.equivalent_linear() == other.equivalent_linear() {
            return true;
        }
        if self.is_compressed() || other.is_compressed() {
            return self.is_compressed()
                && other.is_compressed()
                && self.block_dimensions() == other.block_dimensions()
                && self.block_size_bytes() == other.block_size_bytes();
        }
        !self.is_depth()
            && !other.is_depth()
            && !self.is_planar_yuv()
            && !other.is_planar_yuv()
            && self.bytes_per_pixel() != 0
            && self.bytes_per_pixel() == other.bytes_per_pixel()
    }

    /// Bytes of one row of texels (or of compressed blocks), padded to `row_alignment`.
    ///
    /// For planar YUV formats this is the stride of the luma plane.
    pub fn bytes_per_row(self, width: u32, row_alignment: usize) -> usize {
        let unaligned = if self.is_compressed() {
            let (bw, _) = self.block_dimensions();
            width.div_ceil(bw) as usize * self.block_size_bytes() as usize
        } else if self == PixelFormatGpu::Yuy2 {
            width.div_ceil(2) as usize * 4
        } else if self == PixelFormatGpu::Nv12 {
            width as usize
        } else if self == PixelFormatGpu::P010 {
            width as usize * 2
        } else {
            width as usize * self.bytes_per_pixel() as usize
        };
        align_to(unaligned, row_alignment)
    }

    /// Rows of texels (or compressed blocks) needed to store `height` texels.
    pub fn rows(self, height: u32) -> usize {
        let (_, bh) = self.block_dimensions();
        height.div_ceil(bh) as usize
    }

    /// Bytes of a single mip level with the given extent.
    ///
    /// `depth` and `slices` both multiply the size; they are separate only so
    /// call sites read naturally for 3D and array textures.
    pub fn size_bytes(self, width: u32, height: u32, depth: u32, slices: u32, row_alignment: usize) -> usize {
        let per_image = match self {
            PixelFormatGpu::Nv12 | PixelFormatGpu::P010 => {
                let sample = if self == PixelFormatGpu::Nv12 { 1 } else { 2 };
                let luma = align_to(width as usize * sample, row_alignment) * height as usize;
                let chroma_row = align_to(width.div_ceil(2) as usize * 2 * sample, row_alignment);
                luma + chroma_row * height.div_ceil(2) as usize
            }
            _ => self.bytes_per_row(width, row_alignment) * self.rows(height),
        };
        per_image * depth as usize * slices as usize
    }

    /// Bytes of a full mip chain. `depth` halves with each mip, `slices` does not.
    pub fn mip_chain_size_bytes(
        self,
        width: u32,
        height: u32,
        depth: u32,
        slices: u32,
        num_mipmaps: u8,
        row_alignment: usize,
    ) -> usize {
        (0..num_mipmaps)
            .map(|mip| {
                self.size_bytes(
                    mip_extent(width, mip),
                    mip_extent(height, mip),
                    mip_extent(depth, mip),
                    slices,
                    row_alignment,
                )
            })
            .sum()
    }
}

/// The extent of `value` at mip level `mip`, never less than one.
pub fn mip_extent(value: u32, mip: u8) -> u32 {
    value.checked_shr(mip as u32).unwrap_or(0).max(1)
}

/// Number of mip levels a full chain has for the given extent.
pub fn max_mipmaps(width: u32, height: u32, depth: u32) -> u8 {
    let largest = width.max(height).max(depth);
    if largest == 0 {
        return 0;
    }
    (u32::BITS - largest.leading_zeros()) as u8
}

fn align_to(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        value
    } else {
        value.div_ceil(alignment) * alignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn srgb_equivalents_pair_up() {
        for format in [
            PixelFormatGpu::Rgba8Unorm,
            PixelFormatGpu::Bgra8Unorm,
            PixelFormatGpu::Bc7Unorm,
            PixelFormatGpu::Astc8x8Unorm,
        ] {
            let srgb = format.equivalent_srgb();
            assert!(srgb.is_srgb(), "{}", srgb.name());
            assert_eq!(srgb.equivalent_linear(), format);
        }
        assert_eq!(
            PixelFormatGpu::R32Float.equivalent_srgb(),
            PixelFormatGpu::R32Float
        );
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn depth_and_stencil() {
        assert!(PixelFormatGpu::D32Float.is_depth());
        assert!(!PixelFormatGpu::D32Float.is_stencil());
        assert!(PixelFormatGpu::D24UnormS8Uint.is_stencil());
        assert!(!PixelFormatGpu::Rgba8Unorm.is_depth());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn sizes() {
        // rows are padded to the alignment
        assert_eq!(PixelFormatGpu::R8Unorm.bytes_per_row(3, 4), 4);
        assert_eq!(PixelFormatGpu::R8Unorm.size_bytes(3, 2, 1, 1, 4), 8);
        // one 4x4 block of 8 bytes covers a 1x1 bc1 image
        assert_eq!(PixelFormatGpu::Bc1Unorm.size_bytes(1, 1, 1, 1, 1), 8);
        assert_eq!(PixelFormatGpu::Bc3Unorm.size_bytes(8, 8, 1, 1, 1), 64);
        assert_eq!(PixelFormatGpu::Astc6x6Unorm.size_bytes(12, 12, 1, 1, 1), 64);
        assert_eq!(PixelFormatGpu::Nv12.size_bytes(4, 4, 1, 1, 1), 16 + 8);
        // 4x4 rgba8 chain: 64 + 16 + 4 texels
        assert_eq!(
            PixelFormatGpu::Rgba8Unorm.mip_chain_size_bytes(4, 4, 1, 1, 3, 4),
            (16 + 4 + 1) * 4
        );
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn mips() {
        assert_eq!(max_mipmaps(256, 256, 1), 9);
        assert_eq!(max_mipmaps(1, 1, 1), 1);
        assert_eq!(max_mipmaps(0, 4, 1), 0);
        assert_eq!(mip_extent(256, 8), 1);
        assert_eq!(mip_extent(256, 40), 1);
        assert_eq!(mip_extent(5, 1), 2);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn copy_compatibility() {
        assert!(PixelFormatGpu::Rgba8Unorm.is_copy_compatible(PixelFormatGpu::Rgba8UnormSrgb));
        assert!(PixelFormatGpu::Rgba8Unorm.is_copy_compatible(PixelFormatGpu::R32Float));
        assert!(!PixelFormatGpu::Rgba8Unorm.is_copy_compatible(PixelFormatGpu::Rg8Unorm));
        assert!(PixelFormatGpu::Bc1Unorm.is_copy_compatible(PixelFormatGpu::Bc4Unorm));
        assert!(!PixelFormatGpu::Bc1Unorm.is_copy_compatible(PixelFormatGpu::Rgba16Float));
    }
}

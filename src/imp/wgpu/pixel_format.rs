// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::pixel_formats::PixelFormatGpu;

/// The wgpu format storing texels of `format`, when wgpu has one.
pub(crate) fn wgpu_format(format: PixelFormatGpu) -> Option<wgpu::TextureFormat> {
    use PixelFormatGpu::*;
    use wgpu::TextureFormat as T;
    let astc = |block, channel| T::Astc { block, channel };
    Some(match format {
        Rgba32Float => T::Rgba32Float,
        Rgba32Uint => T::Rgba32Uint,
        Rgba32Sint => T::Rgba32Sint,
        Rgba16Float => T::Rgba16Float,
        Rgba16Unorm => T::Rgba16Unorm,
        Rgba16Uint => T::Rgba16Uint,
        Rgba16Snorm => T::Rgba16Snorm,
        Rgba16Sint => T::Rgba16Sint,
        Rg32Float => T::Rg32Float,
        Rg32Uint => T::Rg32Uint,
        Rg32Sint => T::Rg32Sint,
        D32FloatS8X24Uint => T::Depth32FloatStencil8,
        R10G10B10A2Unorm => T::Rgb10a2Unorm,
        R10G10B10A2Uint => T::Rgb10a2Uint,
        R11G11B10Float => T::Rg11b10Ufloat,
        Rgba8Unorm => T::Rgba8Unorm,
        Rgba8UnormSrgb => T::Rgba8UnormSrgb,
        Rgba8Uint => T::Rgba8Uint,
        Rgba8Snorm => T::Rgba8Snorm,
        Rgba8Sint => T::Rgba8Sint,
        Rg16Float => T::Rg16Float,
        Rg16Unorm => T::Rg16Unorm,
        Rg16Uint => T::Rg16Uint,
        Rg16Snorm => T::Rg16Snorm,
        Rg16Sint => T::Rg16Sint,
        D32Float => T::Depth32Float,
        R32Float => T::R32Float,
        R32Uint => T::R32Uint,
        R32Sint => T::R32Sint,
        D24UnormS8Uint => T::Depth24PlusStencil8,
        D24Unorm => T::Depth24Plus,
        Rg8Unorm => T::Rg8Unorm,
        Rg8Uint => T::Rg8Uint,
        Rg8Snorm => T::Rg8Snorm,
        Rg8Sint => T::Rg8Sint,
        R16Float => T::R16Float,
        D16Unorm => T::Depth16Unorm,
        R16Unorm => T::R16Unorm,
        R16Uint => T::R16Uint,
        R16Snorm => T::R16Snorm,
        R16Sint => T::R16Sint,
        R8Unorm => T::R8Unorm,
        R8Uint => T::R8Uint,
        R8Snorm => T::R8Snorm,
        R8Sint => T::R8Sint,
        R9G9B9E5SharedExp => T::Rgb9e5Ufloat,
        Bgra8Unorm | Bgrx8Unorm => T::Bgra8Unorm,
        Bgra8UnormSrgb | Bgrx8UnormSrgb => T::Bgra8UnormSrgb,
        Bc1Unorm => T::Bc1RgbaUnorm,
        Bc1UnormSrgb => T::Bc1RgbaUnormSrgb,
        Bc2Unorm => T::Bc2RgbaUnorm,
        Bc2UnormSrgb => T::Bc2RgbaUnormSrgb,
        Bc3Unorm => T::Bc3RgbaUnorm,
        Bc3UnormSrgb => T::Bc3RgbaUnormSrgb,
        Bc4Unorm => T::Bc4RUnorm,
        Bc4Snorm => T::Bc4RSnorm,
        Bc5Unorm => T::Bc5RgUnorm,
        Bc5Snorm => T::Bc5RgSnorm,
        Bc6hUf16 => T::Bc6hRgbUfloat,
        Bc6hSf16 => T::Bc6hRgbFloat,
        Bc7Unorm => T::Bc7RgbaUnorm,
        Bc7UnormSrgb => T::Bc7RgbaUnormSrgb,
        Etc2Rgb8Unorm => T::Etc2Rgb8Unorm,
        Etc2Rgb8UnormSrgb => T::Etc2Rgb8UnormSrgb,
        Etc2Rgb8A1Unorm => T::Etc2Rgb8A1Unorm,
        Etc2Rgb8A1UnormSrgb => T::Etc2Rgb8A1UnormSrgb,
        Etc2Rgba8Unorm => T::Etc2Rgba8Unorm,
        Etc2Rgba8UnormSrgb => T::Etc2Rgba8UnormSrgb,
        Astc4x4Unorm => astc(wgpu::AstcBlock::B4x4, wgpu::AstcChannel::Unorm),
        Astc4x4UnormSrgb => astc(wgpu::AstcBlock::B4x4, wgpu::AstcChannel::UnormSrgb),
        Astc6x6Unorm => astc(wgpu::AstcBlock::B6x6, wgpu::AstcChannel::Unorm),
        Astc6x6UnormSrgb => astc(wgpu::AstcBlock::B6x6, wgpu::AstcChannel::UnormSrgb),
        Astc8x8Unorm => astc(wgpu::AstcBlock::B8x8, wgpu::AstcChannel::Unorm),
        Astc8x8UnormSrgb => astc(wgpu::AstcBlock::B8x8, wgpu::AstcChannel::UnormSrgb),
        Nv12 => T::NV12,
        _ => return None,
    })
}

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! PNG support for decoded images and texture readback.
//!
//! [`PngCodec`] decodes PNG files into [`Image2`]s in [`PixelFormatGpu::Rgba8Unorm`],
//! and [`encode_png`] writes texel data in a handful of uncompressed formats.

use std::io::Write;

use png::{BitDepth, ColorType};

use crate::error::Error;
use crate::pixel_formats::{PixelFormatGpu, SYS_RAM_ROW_ALIGNMENT};
use crate::textures::{Image2, ImageCodec, TextureType};

/// The PNG color type and bit depth a format is written with.
fn png_layout(format: PixelFormatGpu) -> Option<(ColorType, BitDepth)> {
    use PixelFormatGpu::*;
    match format {
        R8Unorm | A8Unorm | R16Float | R32Float => Some((ColorType::Grayscale, BitDepth::Eight)),
        Rg8Unorm => Some((ColorType::GrayscaleAlpha, BitDepth::Eight)),
        R16Unorm => Some((ColorType::Grayscale, BitDepth::Sixteen)),
        Rgba16Unorm => Some((ColorType::Rgba, BitDepth::Sixteen)),
        Rgba8Unorm | Rgba8UnormSrgb | Bgra8Unorm | Bgra8UnormSrgb | Bgrx8Unorm | Bgrx8UnormSrgb
        | Rgba16Float | Rgba32Float => Some((ColorType::Rgba, BitDepth::Eight)),
        _ => None,
    }
}

fn unit_float_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Converts one row of texels into the byte layout PNG expects for the format.
fn convert_row(format: PixelFormatGpu, row: &[u8], width: usize, out: &mut Vec<u8>) {
    use PixelFormatGpu::*;
    match format {
        R8Unorm | A8Unorm | Rg8Unorm | Rgba8Unorm | Rgba8UnormSrgb => {
            out.extend_from_slice(&row[..width * format.bytes_per_pixel() as usize]);
        }
        Bgra8Unorm | Bgra8UnormSrgb | Bgrx8Unorm | Bgrx8UnormSrgb => {
            let opaque = matches!(format, Bgrx8Unorm | Bgrx8UnormSrgb);
            for texel in row[..width * 4].chunks_exact(4) {
                out.extend_from_slice(&[
                    texel[2],
                    texel[1],
                    texel[0],
                    if opaque { 255 } else { texel[3] },
                ]);
            }
        }
        // png stores 16-bit samples big-endian
        R16Unorm | Rgba16Unorm => {
            for sample in row[..width * format.bytes_per_pixel() as usize].chunks_exact(2) {
                out.extend_from_slice(&[sample[1], sample[0]]);
            }
        }
        R16Float | Rgba16Float => {
            for sample in row[..width * format.bytes_per_pixel() as usize].chunks_exact(2) {
                let value = half::f16::from_bits(u16::from_le_bytes([sample[0], sample[1]]));
                out.push(unit_float_to_u8(value.to_f32()));
            }
        }
        R32Float | Rgba32Float => {
            for sample in row[..width * format.bytes_per_pixel() as usize].chunks_exact(4) {
                let value = f32::from_le_bytes([sample[0], sample[1], sample[2], sample[3]]);
                out.push(unit_float_to_u8(value));
            }
        }
        _ => unreachable!("convert_row called for a format without a png layout"),
    }
}

/// Encodes a single 2D image as PNG.
///
/// `data` holds `height` rows of `bytes_per_row` bytes each; padding past the
/// texels of a row is ignored.
pub fn encode_png<W: Write>(
    w: W,
    width: u32,
    height: u32,
    format: PixelFormatGpu,
    data: &[u8],
    bytes_per_row: usize,
) -> Result<(), Error> {
    let Some((color_type, bit_depth)) = png_layout(format) else {
        return Err(Error::NotImplemented(format!(
            "writing {} textures as png",
            format.name()
        )));
    };
    let required = bytes_per_row * height as usize;
    if data.len() < required {
        return Err(Error::invalid_parameters(format!(
            "png encode needs {required} bytes but {} were provided",
            data.len()
        )));
    }
    let mut tight = Vec::with_capacity(required);
    for row in data.chunks(bytes_per_row).take(height as usize) {
        convert_row(format, row, width as usize, &mut tight);
    }
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(color_type);
    encoder.set_depth(bit_depth);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&tight)?;
    writer.finish()?;
    Ok(())
}

/// Decodes PNG files into single-mip [`PixelFormatGpu::Rgba8Unorm`] images.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
    fn extensions(&self) -> &[&'static str] {
        &["png"]
    }

    fn decode(&self, bytes: &[u8]) -> Result<Image2, Error> {
        let mut decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;
        let (width, height) = {
            let info = reader.info();
            (info.width, info.height)
        };
        let buffer_size = reader
            .output_line_size(width)
            .and_then(|line_size| line_size.checked_mul(height as usize))
            .ok_or_else(|| Error::invalid_parameters(format!("png of {width}x{height} is too large to decode")))?;
        let mut buf = vec![0; buffer_size];
        let frame = reader.next_frame(&mut buf)?;
        let channels = match frame.color_type {
            ColorType::Grayscale => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
            ColorType::Indexed => {
                return Err(Error::NotImplemented(
                    "indexed png without palette expansion".to_string(),
                ));
            }
        };
        let format = PixelFormatGpu::Rgba8Unorm;
        let bytes_per_row = format.bytes_per_row(width, SYS_RAM_ROW_ALIGNMENT);
        let mut data = Vec::with_capacity(bytes_per_row * height as usize);
        for row in buf.chunks(frame.line_size).take(height as usize) {
            for texel in row[..width as usize * channels].chunks_exact(channels) {
                let rgba = match channels {
                    1 => [texel[0], texel[0], texel[0], 255],
                    2 => [texel[0], texel[0], texel[0], texel[1]],
                    3 => [texel[0], texel[1], texel[2], 255],
                    _ => [texel[0], texel[1], texel[2], texel[3]],
                };
                data.extend_from_slice(&rgba);
            }
        }
        Image2::new(
            width,
            height,
            1,
            1,
            TextureType::Type2D,
            format,
            data.into_boxed_slice(),
        )
    }

    fn encode(&self, image: &Image2) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        encode_png(
            &mut out,
            image.width(),
            image.height(),
            image.pixel_format(),
            image.mip_data(0)?,
            image.bytes_per_row(0),
        )?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn png_round_trip_keeps_texels() {
        let texels: Vec<u8> = (0..4u8 * 3 * 2).collect();
        let image = Image2::new(
            3,
            2,
            1,
            1,
            TextureType::Type2D,
            PixelFormatGpu::Rgba8Unorm,
            texels.clone().into_boxed_slice(),
        )
        .unwrap();
        let encoded = PngCodec.encode(&image).unwrap();
        let decoded = PngCodec.decode(&encoded).unwrap();
        assert_eq!(decoded.width(), 3);
        assert_eq!(decoded.height(), 2);
        assert_eq!(decoded.mip_data(0).unwrap(), &texels[..]);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn bgra_is_swizzled() {
        let mut out = Vec::new();
        encode_png(&mut out, 1, 1, PixelFormatGpu::Bgra8Unorm, &[1, 2, 3, 4], 4).unwrap();
        let decoded = PngCodec.decode(&out).unwrap();
        assert_eq!(decoded.mip_data(0).unwrap(), &[3, 2, 1, 4]);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn compressed_formats_are_not_encoded() {
        let err = encode_png(Vec::new(), 4, 4, PixelFormatGpu::Bc1Unorm, &[0; 8], 8).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotImplemented);
    }
}

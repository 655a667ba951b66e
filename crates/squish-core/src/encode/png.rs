//! PNG encoding with a lossy quality knob.
//!
//! PNG itself is lossless, so "quality" is applied before encoding by
//! posterizing each color channel: fewer distinct values per channel give
//! deflate longer runs to work with. Quality 100 keeps the pixels exactly.
//! Alpha is never posterized.

use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::EncodeError;
use crate::decode::PixelLayout;

/// Number of levels per color channel for a quality in 1..=100.
///
/// `2 + round(quality * 254 / 100)`, with quality clamped to 1..=100: 5 levels
/// at quality 1 up to 256 levels (lossless) at 100.
pub fn posterize_levels(quality: u8) -> u16 {
    let quality = u32::from(quality.clamp(1, 100));
    (2 + (quality * 254 + 50) / 100) as u16
}

/// Reduce every color channel to `levels` evenly spaced values.
///
/// The alpha channel of RGBA data is copied unchanged. `levels >= 256`
/// returns the input as is.
pub fn posterize(pixels: &[u8], layout: PixelLayout, levels: u16) -> Vec<u8> {
    if levels >= 256 {
        return pixels.to_vec();
    }

    let steps = f32::from(levels.max(2) - 1);
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let bucket = (value as f32 * steps / 255.0).round();
        *slot = (bucket * 255.0 / steps).round() as u8;
    }

    let channels = layout.channels();
    pixels
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if channels == 4 && i % 4 == 3 {
                v
            } else {
                lut[v as usize]
            }
        })
        .collect()
}

/// Encode RGB or RGBA pixel data to PNG bytes.
///
/// # Arguments
///
/// * `pixels` - Pixel data in `layout` (row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `layout` - Whether `pixels` is RGB8 or RGBA8
/// * `quality` - 1-100; below 100 the color channels are posterized first
///
/// # Returns
///
/// PNG-encoded bytes on success, or an error if encoding fails.
pub fn encode_png(
    pixels: &[u8],
    width: u32,
    height: u32,
    layout: PixelLayout,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * layout.channels();
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let color = match layout {
        PixelLayout::Rgb8 => ExtendedColorType::Rgb8,
        PixelLayout::Rgba8 => ExtendedColorType::Rgba8,
    };
    let reduced = posterize(pixels, layout, posterize_levels(quality));

    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive)
        .write_image(&reduced, width, height, color)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    /// Per-pixel xorshift noise over a horizontal gradient.
    fn noisy(width: u32, height: u32, channels: usize) -> Vec<u8> {
        let mut state: u32 = 0x9E37_79B9;
        let mut pixels = Vec::with_capacity((width * height) as usize * channels);
        for _y in 0..height {
            for x in 0..width {
                for _ in 0..channels {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    pixels.push(((x * 255 / width) as u8 / 2).wrapping_add((state % 128) as u8));
                }
            }
        }
        pixels
    }

    #[test]
    fn test_posterize_levels_range() {
        assert_eq!(posterize_levels(100), 256);
        assert_eq!(posterize_levels(1), 5);
        assert_eq!(posterize_levels(0), 5); // clamped to 1
        assert_eq!(posterize_levels(50), 129);
    }

    #[test]
    fn test_posterize_two_levels() {
        let out = posterize(&[0, 100, 127, 128, 200, 255], PixelLayout::Rgb8, 2);
        assert_eq!(out, vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_posterize_keeps_alpha() {
        let out = posterize(&[10, 20, 30, 77, 250, 240, 230, 3], PixelLayout::Rgba8, 2);
        assert_eq!(out, vec![0, 0, 0, 77, 255, 255, 255, 3]);
    }

    #[test]
    fn test_posterize_lossless_at_256() {
        let pixels = noisy(8, 8, 3);
        assert_eq!(posterize(&pixels, PixelLayout::Rgb8, 256), pixels);
    }

    #[test]
    fn test_encode_png_signature() {
        let png = encode_png(&noisy(16, 16, 3), 16, 16, PixelLayout::Rgb8, 100).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_encode_png_quality_affects_size() {
        let pixels = noisy(64, 64, 3);
        let low = encode_png(&pixels, 64, 64, PixelLayout::Rgb8, 1).unwrap();
        let high = encode_png(&pixels, 64, 64, PixelLayout::Rgb8, 100).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_encode_png_rgba() {
        let png = encode_png(&noisy(8, 8, 4), 8, 8, PixelLayout::Rgba8, 80).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_encode_png_invalid_pixel_data() {
        let result = encode_png(&[0u8; 10], 2, 2, PixelLayout::Rgba8, 90);
        assert!(matches!(
            result,
            Err(EncodeError::InvalidPixelData {
                expected: 16,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_encode_png_zero_dimensions() {
        let result = encode_png(&[], 0, 4, PixelLayout::Rgb8, 90);
        assert!(matches!(result, Err(EncodeError::InvalidDimensions { .. })));
    }
}

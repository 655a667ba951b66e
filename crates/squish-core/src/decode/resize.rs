//! Raster downscaling for the resolution fallback.
//!
//! The search expresses resolution as a single linear scale factor; these
//! helpers turn that factor into concrete output dimensions and a resized
//! raster, leaving the source untouched.

use image::DynamicImage;

use super::{DecodeError, FilterType, SourceImage};

/// Dimensions of `width x height` after applying `scale` to both edges.
///
/// Each edge is rounded down and never drops below 1 pixel. Scales outside
/// (0, 1] are clamped into that range.
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let scale = if scale.is_finite() {
        scale.clamp(f32::MIN_POSITIVE, 1.0)
    } else {
        1.0
    };
    // f32 factors like 0.9 sit just below their decimal value; snap to 6 digits
    // so 1000 * 0.9 floors to 900, not 899.
    let scale = (f64::from(scale) * 1e6).round() / 1e6;
    let edge = |len: u32| ((f64::from(len) * scale + 1e-9).floor() as u32).clamp(1, len.max(1));
    (edge(width), edge(height))
}

/// Resize a source image by a linear scale factor.
///
/// A scale that leaves the dimensions unchanged returns the raster as is.
///
/// # Errors
///
/// Returns `DecodeError::InvalidPixelData` if the source buffer cannot be
/// viewed as an image of its declared dimensions.
pub fn resize_by_scale(
    image: &SourceImage,
    scale: f32,
    filter: FilterType,
) -> Result<DynamicImage, DecodeError> {
    let expected = (image.width() as usize) * (image.height() as usize) * image.layout().channels();
    let raster = image.to_dynamic().ok_or(DecodeError::InvalidPixelData {
        expected,
        actual: image.pixels().len(),
    })?;

    let (width, height) = scaled_dimensions(image.width(), image.height(), scale);
    if width == image.width() && height == image.height() {
        return Ok(raster);
    }

    Ok(raster.resize_exact(width, height, filter.to_image_filter()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{PixelLayout, SourceFormat};

    fn create_test_image(width: u32, height: u32, layout: PixelLayout) -> SourceImage {
        let channels = layout.channels();
        let mut pixels = Vec::with_capacity((width * height) as usize * channels);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8); // R
                pixels.push(((y * 255) / height.max(1)) as u8); // G
                pixels.push(128); // B
                if channels == 4 {
                    pixels.push(200); // A
                }
            }
        }
        SourceImage::new(width, height, layout, pixels, 10_000, SourceFormat::Png).unwrap()
    }

    #[test]
    fn test_scaled_dimensions_floor() {
        assert_eq!(scaled_dimensions(100, 50, 0.5), (50, 25));
        assert_eq!(scaled_dimensions(101, 51, 0.5), (50, 25));
        assert_eq!(scaled_dimensions(1000, 667, 0.9), (900, 600));
    }

    #[test]
    fn test_scaled_dimensions_minimum_one_pixel() {
        assert_eq!(scaled_dimensions(10, 3, 0.01), (1, 1));
        assert_eq!(scaled_dimensions(1, 1, 0.1), (1, 1));
    }

    #[test]
    fn test_scaled_dimensions_full_scale() {
        assert_eq!(scaled_dimensions(640, 480, 1.0), (640, 480));
    }

    #[test]
    fn test_scaled_dimensions_out_of_range_clamped() {
        assert_eq!(scaled_dimensions(640, 480, 2.0), (640, 480));
        assert_eq!(scaled_dimensions(640, 480, f32::NAN), (640, 480));
        assert_eq!(scaled_dimensions(640, 480, -1.0), (1, 1));
    }

    #[test]
    fn test_resize_by_scale_rgb() {
        let img = create_test_image(100, 50, PixelLayout::Rgb8);
        let resized = resize_by_scale(&img, 0.5, FilterType::Lanczos3).unwrap();

        assert_eq!((resized.width(), resized.height()), (50, 25));
        assert!(!resized.color().has_alpha());
    }

    #[test]
    fn test_resize_by_scale_keeps_alpha() {
        let img = create_test_image(40, 40, PixelLayout::Rgba8);
        let resized = resize_by_scale(&img, 0.25, FilterType::Bilinear).unwrap();

        assert_eq!((resized.width(), resized.height()), (10, 10));
        assert!(resized.color().has_alpha());
    }

    #[test]
    fn test_resize_by_scale_identity() {
        let img = create_test_image(20, 10, PixelLayout::Rgb8);
        let resized = resize_by_scale(&img, 1.0, FilterType::Nearest).unwrap();

        assert_eq!(resized.into_rgb8().into_raw(), img.pixels());
    }

    #[test]
    fn test_all_filter_types() {
        let img = create_test_image(100, 50, PixelLayout::Rgb8);

        for filter in [
            FilterType::Nearest,
            FilterType::Bilinear,
            FilterType::Lanczos3,
        ] {
            let resized = resize_by_scale(&img, 0.5, filter).unwrap();
            assert_eq!((resized.width(), resized.height()), (50, 25));
        }
    }
}

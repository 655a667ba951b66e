//! The encode oracle: the search's only view of the encoder.
//!
//! The search never touches pixels. It hands an [`EncodeParams`] to an
//! [`EncodeOracle`] and looks at the size of what comes back. Any
//! `FnMut(EncodeParams) -> Option<EncodeResult>` is an oracle, which keeps
//! tests and alternative encoders (e.g. a browser canvas) cheap to plug in.
//! [`ImageOracle`] is the real one, backed by the `image` crate encoders.

use image::DynamicImage;
use tracing::{trace, warn};

use crate::decode::{resize_by_scale, FilterType, PixelLayout, SourceFormat, SourceImage};
use crate::encode::{encode_jpeg, encode_png, quality_percent, EncodeError};
use crate::search::{EncodeParams, EncodeResult};

/// Maps encoder parameters to an encoded result.
///
/// Implementations are assumed deterministic: the same parameters on the same
/// image give the same size. `None` means the encoder declined to produce
/// output; the search treats that as terminal.
pub trait EncodeOracle {
    /// Encode at `params`.
    fn encode(&mut self, params: EncodeParams) -> Option<EncodeResult>;
}

impl<F> EncodeOracle for F
where
    F: FnMut(EncodeParams) -> Option<EncodeResult>,
{
    fn encode(&mut self, params: EncodeParams) -> Option<EncodeResult> {
        self(params)
    }
}

/// Encodes a [`SourceImage`] with the encoder family it was uploaded in.
///
/// The most recently resized raster is cached, so a whole pass at one scale
/// resizes once.
#[derive(Debug)]
pub struct ImageOracle<'a> {
    image: &'a SourceImage,
    filter: FilterType,
    scaled: Option<(f32, DynamicImage)>,
}

impl<'a> ImageOracle<'a> {
    /// Create an oracle over `image` using Lanczos3 for downscaling.
    pub fn new(image: &'a SourceImage) -> Self {
        Self {
            image,
            filter: FilterType::default(),
            scaled: None,
        }
    }

    /// Use a different downscaling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    fn try_encode(&mut self, params: EncodeParams) -> Result<Vec<u8>, EncodeError> {
        let quality = quality_percent(params.quality());
        let format = self.image.format();

        if params.scale() >= 1.0 {
            return encode_raw(
                format,
                self.image.pixels(),
                self.image.width(),
                self.image.height(),
                self.image.layout(),
                quality,
            );
        }

        let raster = self.raster_at(params.scale())?;
        match format {
            SourceFormat::Jpeg => {
                let rgb = raster.to_rgb8();
                encode_jpeg(rgb.as_raw(), rgb.width(), rgb.height(), quality)
            }
            SourceFormat::Png if raster.color().has_alpha() => {
                let rgba = raster.to_rgba8();
                encode_png(rgba.as_raw(), rgba.width(), rgba.height(), PixelLayout::Rgba8, quality)
            }
            SourceFormat::Png => {
                let rgb = raster.to_rgb8();
                encode_png(rgb.as_raw(), rgb.width(), rgb.height(), PixelLayout::Rgb8, quality)
            }
        }
    }

    fn raster_at(&mut self, scale: f32) -> Result<&DynamicImage, EncodeError> {
        let cached = matches!(&self.scaled, Some((s, _)) if *s == scale);
        if !cached {
            trace!(scale, "resizing source raster");
            let resized = resize_by_scale(self.image, scale, self.filter)
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
            self.scaled = Some((scale, resized));
        }

        match &self.scaled {
            Some((_, raster)) => Ok(raster),
            None => Err(EncodeError::EncodingFailed("no scaled raster".to_string())),
        }
    }
}

impl EncodeOracle for ImageOracle<'_> {
    fn encode(&mut self, params: EncodeParams) -> Option<EncodeResult> {
        match self.try_encode(params) {
            Ok(bytes) if !bytes.is_empty() => Some(EncodeResult::from_payload(bytes)),
            Ok(_) => {
                warn!(quality = params.quality(), scale = params.scale(), "encoder produced zero bytes");
                None
            }
            Err(e) => {
                warn!(quality = params.quality(), scale = params.scale(), error = %e, "encoding failed");
                None
            }
        }
    }
}

fn encode_raw(
    format: SourceFormat,
    pixels: &[u8],
    width: u32,
    height: u32,
    layout: PixelLayout,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    match (format, layout) {
        (SourceFormat::Jpeg, PixelLayout::Rgb8) => encode_jpeg(pixels, width, height, quality),
        (SourceFormat::Jpeg, PixelLayout::Rgba8) => {
            let rgb: Vec<u8> = pixels
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            encode_jpeg(&rgb, width, height, quality)
        }
        (SourceFormat::Png, layout) => encode_png(pixels, width, height, layout, quality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo_like(width: u32, height: u32, layout: PixelLayout, format: SourceFormat) -> SourceImage {
        let channels = layout.channels();
        let mut pixels = Vec::with_capacity((width * height) as usize * channels);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width) as u8);
                pixels.push(((y * 255) / height) as u8);
                pixels.push(((x * 31 + y * 17) % 256) as u8);
                if channels == 4 {
                    pixels.push(((x + y) * 4 % 256) as u8);
                }
            }
        }
        SourceImage::new(width, height, layout, pixels, 1_000_000, format).unwrap()
    }

    #[test]
    fn test_closure_is_an_oracle() {
        let mut calls = 0;
        let mut oracle = |params: EncodeParams| {
            calls += 1;
            Some(EncodeResult::with_reported_size(
                (params.quality() * 100.0) as u64,
                Vec::new(),
            ))
        };
        let result = oracle.encode(EncodeParams::full_resolution(0.5).unwrap()).unwrap();
        assert_eq!(result.byte_size(), 50);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_jpeg_oracle_produces_jpeg() {
        let image = photo_like(64, 48, PixelLayout::Rgb8, SourceFormat::Jpeg);
        let mut oracle = ImageOracle::new(&image);

        let result = oracle.encode(EncodeParams::full_resolution(0.8).unwrap()).unwrap();
        assert_eq!(&result.payload()[0..2], &[0xFF, 0xD8]);
        assert_eq!(result.byte_size(), result.payload().len() as u64);
    }

    #[test]
    fn test_jpeg_oracle_quality_monotone_enough() {
        let image = photo_like(64, 64, PixelLayout::Rgb8, SourceFormat::Jpeg);
        let mut oracle = ImageOracle::new(&image);

        let low = oracle.encode(EncodeParams::full_resolution(0.1).unwrap()).unwrap();
        let high = oracle.encode(EncodeParams::full_resolution(0.9).unwrap()).unwrap();
        assert!(low.byte_size() < high.byte_size());
    }

    #[test]
    fn test_oracle_scale_shrinks_output() {
        let image = photo_like(128, 128, PixelLayout::Rgb8, SourceFormat::Jpeg);
        let mut oracle = ImageOracle::new(&image);

        let full = oracle.encode(EncodeParams::new(0.8, 1.0).unwrap()).unwrap();
        let quarter = oracle.encode(EncodeParams::new(0.8, 0.25).unwrap()).unwrap();
        assert!(quarter.byte_size() < full.byte_size());

        let decoded = image::load_from_memory(quarter.payload()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
    }

    #[test]
    fn test_png_oracle_keeps_alpha_when_scaled() {
        let image = photo_like(32, 32, PixelLayout::Rgba8, SourceFormat::Png);
        let mut oracle = ImageOracle::new(&image).with_filter(FilterType::Bilinear);

        let result = oracle.encode(EncodeParams::new(0.5, 0.5).unwrap()).unwrap();
        let decoded = image::load_from_memory(result.payload()).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn test_oracle_is_deterministic() {
        let image = photo_like(40, 30, PixelLayout::Rgb8, SourceFormat::Png);
        let mut oracle = ImageOracle::new(&image);
        let params = EncodeParams::new(0.3, 0.7).unwrap();

        let first = oracle.encode(params).unwrap();
        let second = oracle.encode(params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_raster_cache_follows_scale() {
        let image = photo_like(50, 50, PixelLayout::Rgb8, SourceFormat::Jpeg);
        let mut oracle = ImageOracle::new(&image);

        assert_eq!(oracle.raster_at(0.5).unwrap().width(), 25);
        assert_eq!(oracle.raster_at(0.5).unwrap().width(), 25);
        assert_eq!(oracle.raster_at(0.2).unwrap().width(), 10);
    }
}

//! One-shot pipeline: validate, decode, search, package.
//!
//! This is what front-ends call. It glues [`validate`](crate::validate),
//! [`decode`](crate::decode), [`ImageOracle`] and [`search`] together and
//! returns a [`Compressed`] ready to be shown and downloaded.

use thiserror::Error;
use tracing::debug;

use crate::decode::{decode_image, scaled_dimensions, DecodeError, SourceFormat};
use crate::oracle::ImageOracle;
use crate::search::{search, Fit, SearchConfig, SearchError, TargetSpec};
use crate::validate::{reduction_percent, validate_target_kb, validate_upload, ValidationError};

/// File name used for downloads when the upload had none.
pub const DEFAULT_FILE_NAME: &str = "image.jpg";

/// Any failure along the pipeline.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// A compressed image and what it took to get there.
#[derive(Debug, Clone)]
pub struct Compressed {
    payload: Vec<u8>,
    format: SourceFormat,
    original_size: u64,
    width: u32,
    height: u32,
    quality: f32,
    scale: f32,
    oracle_calls: u32,
    fit: Fit,
}

impl Compressed {
    /// The encoded bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the encoded bytes.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Size of the encoded bytes.
    pub fn byte_size(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Size of the upload.
    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    /// Encoder family of the output (same as the upload).
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// MIME type of the output.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Chosen quality in (0, 1].
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Chosen scale in (0, 1].
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Oracle calls the search used.
    pub fn oracle_calls(&self) -> u32 {
        self.oracle_calls
    }

    /// Whether the result fits the budget or is only the closest achievable.
    pub fn fit(&self) -> Fit {
        self.fit
    }

    /// Percent saved relative to the upload, one decimal.
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_size, self.byte_size())
    }
}

/// Download name for a compressed file: `compressed-<original name>`.
pub fn download_name(original_name: Option<&str>) -> String {
    let name = original_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME);
    format!("compressed-{name}")
}

/// Compress an upload toward `target`.
///
/// # Errors
///
/// Fails with `CompressError::Validation` for unsupported or oversized
/// uploads, `CompressError::Decode` if the image can't be decoded, and
/// `CompressError::Search` if no acceptable result exists.
pub fn compress_to_target(
    bytes: &[u8],
    target: &TargetSpec,
    config: &SearchConfig,
) -> Result<Compressed, CompressError> {
    validate_upload(bytes)?;
    let image = decode_image(bytes)?;

    let mut oracle = ImageOracle::new(&image);
    let outcome = search(&image, target, config, &mut oracle)?;

    let params = outcome.params();
    let (width, height) = scaled_dimensions(image.width(), image.height(), params.scale());
    debug!(
        original_size = image.original_size(),
        size = outcome.byte_size(),
        width,
        height,
        "compressed upload"
    );

    Ok(Compressed {
        format: image.format(),
        original_size: image.original_size(),
        width,
        height,
        quality: params.quality(),
        scale: params.scale(),
        oracle_calls: outcome.oracle_calls(),
        fit: outcome.fit(),
        payload: outcome.into_result().into_payload(),
    })
}

/// Compress an upload toward a target given in KB.
///
/// The target is checked against the upload size first, the way the
/// upload form does it. `allow_downscale` opts the target into the
/// resolution fallback; `config.scale_fallback` must also be set for it
/// to take effect.
pub fn compress_upload(
    bytes: &[u8],
    target_kb: u64,
    allow_downscale: bool,
    config: &SearchConfig,
) -> Result<Compressed, CompressError> {
    let mut target = validate_target_kb(target_kb, bytes.len() as u64)?;
    if allow_downscale {
        target = target.allow_downscale();
    }
    compress_to_target(bytes, &target, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_name() {
        assert_eq!(download_name(Some("holiday.png")), "compressed-holiday.png");
        assert_eq!(download_name(Some("  ")), "compressed-image.jpg");
        assert_eq!(download_name(None), "compressed-image.jpg");
    }

    #[test]
    fn test_compress_rejects_garbage() {
        let result = compress_to_target(b"not an image", &TargetSpec::new(10), &SearchConfig::default());
        assert!(matches!(
            result,
            Err(CompressError::Validation(ValidationError::UnsupportedType))
        ));
    }

    #[test]
    fn test_compress_upload_rejects_large_target() {
        let result = compress_upload(&[0xFF, 0xD8, 0xFF, 0xE0], 10, false, &SearchConfig::default());
        assert!(matches!(
            result,
            Err(CompressError::Validation(ValidationError::TargetNotSmaller { .. }))
        ));
    }

    #[test]
    fn test_compress_error_display_is_transparent() {
        let err = CompressError::from(SearchError::OracleUnavailable { oracle_calls: 1 });
        assert_eq!(err.to_string(), "Encoder produced no output after 1 call(s)");
    }
}

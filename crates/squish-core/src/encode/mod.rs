//! Image encoding for Squish.
//!
//! This module provides the two encoder families a compressed result can be
//! written in:
//! - JPEG with the usual 1-100 quality scale
//! - PNG, where quality below 100 posterizes the color channels first
//!
//! The search works with a normalized quality in (0, 1];
//! [`quality_percent`] converts it to the encoders' 1-100 scale.
//!
//! # Examples
//!
//! ```ignore
//! use squish_core::encode::encode_jpeg;
//!
//! let pixels = vec![128u8; 100 * 100 * 3]; // Gray image
//! let jpeg_bytes = encode_jpeg(&pixels, 100, 100, 90).unwrap();
//! println!("Encoded {} bytes", jpeg_bytes.len());
//! ```

mod jpeg;
mod png;

use thiserror::Error;

pub use jpeg::encode_jpeg;
pub use png::{encode_png, posterize, posterize_levels};

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Convert a normalized quality in (0, 1] to the encoders' 1-100 scale.
pub fn quality_percent(quality: f32) -> u8 {
    if !quality.is_finite() {
        return 100;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_percent() {
        assert_eq!(quality_percent(0.001), 1);
        assert_eq!(quality_percent(0.5), 50);
        assert_eq!(quality_percent(0.95), 95);
        assert_eq!(quality_percent(1.0), 100);
        assert_eq!(quality_percent(f32::NAN), 100);
    }

    #[test]
    fn test_encode_error_display() {
        let err = EncodeError::InvalidDimensions {
            width: 0,
            height: 5,
        };
        assert_eq!(
            err.to_string(),
            "Invalid dimensions: width (0) and height (5) must be non-zero"
        );
    }
}

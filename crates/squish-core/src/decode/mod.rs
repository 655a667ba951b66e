//! Upload decoding for Squish.
//!
//! This module provides functionality for:
//! - Sniffing and decoding JPEG and PNG uploads into a [`SourceImage`]
//! - Applying EXIF orientation to JPEG sources
//! - Downscaling a source by a linear factor for the resolution fallback
//!
//! # Examples
//!
//! ```ignore
//! use squish_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} ({} bytes)", image.width(), image.height(), image.original_size());
//! ```

mod resize;
mod source;
mod types;

pub use resize::{resize_by_scale, scaled_dimensions};
pub use source::{decode_image, detect_format, get_orientation};
pub use types::{DecodeError, FilterType, Orientation, PixelLayout, SourceFormat, SourceImage};

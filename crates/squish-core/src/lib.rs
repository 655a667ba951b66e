//! Squish Core - size-targeting image compression
//!
//! This crate finds the encoder settings that bring a JPEG or PNG upload
//! under a requested byte size while keeping as much quality as possible.
//! It includes upload validation, decoding, the JPEG/PNG encoders, the
//! bounded quality search and an optional resolution fallback.

pub mod compress;
pub mod decode;
pub mod encode;
pub mod oracle;
pub mod search;
pub mod validate;

pub use compress::{compress_to_target, compress_upload, download_name, CompressError, Compressed};
pub use oracle::{EncodeOracle, ImageOracle};
pub use search::{
    search, EncodeParams, EncodeResult, Fit, SearchConfig, SearchError, SearchOutcome, TargetSpec,
};
pub use validate::{format_size, reduction_percent, ValidationError};

//! Upload and target validation, plus the size formatting shown to users.
//!
//! These checks run before anything is decoded or searched: only JPEG and
//! PNG uploads up to 10 MiB are accepted, and a target must be strictly
//! smaller than the original file.

use thiserror::Error;

use crate::decode::{detect_format, SourceFormat};
use crate::search::TargetSpec;

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Target sizes offered as presets, in KB.
pub const PRESET_TARGETS_KB: [u64; 4] = [100, 500, 1000, 2000];

/// Reasons an upload or target is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing was uploaded.
    #[error("The uploaded file is empty")]
    Empty,

    /// Upload exceeds [`MAX_UPLOAD_BYTES`].
    #[error("File too large: {size} bytes (maximum {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    /// Upload is not a JPEG or PNG.
    #[error("Invalid file type: please upload a JPG or PNG image")]
    UnsupportedType,

    /// Target of zero KB.
    #[error("Target size must be greater than 0 KB")]
    ZeroTarget,

    /// Target not smaller than the original.
    #[error("Target size ({target_kb} KB) must be smaller than the original ({original_kb} KB)")]
    TargetNotSmaller { target_kb: u64, original_kb: u64 },
}

/// Check an upload's size and type, returning its detected format.
pub fn validate_upload(bytes: &[u8]) -> Result<SourceFormat, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::Empty);
    }

    let size = bytes.len() as u64;
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }

    detect_format(bytes).map_err(|_| ValidationError::UnsupportedType)
}

/// Original size in whole KB, rounded up.
pub fn original_size_kb(original_size: u64) -> u64 {
    original_size.div_ceil(1024)
}

/// Validate a target given in KB against the original size in bytes.
///
/// The comparison happens in KB (original rounded up), so a 1500-byte
/// upload accepts a 1 KB target.
pub fn validate_target_kb(target_kb: u64, original_size: u64) -> Result<TargetSpec, ValidationError> {
    if target_kb == 0 {
        return Err(ValidationError::ZeroTarget);
    }

    let original_kb = original_size_kb(original_size);
    if target_kb >= original_kb {
        return Err(ValidationError::TargetNotSmaller {
            target_kb,
            original_kb,
        });
    }

    Ok(TargetSpec::from_kb(target_kb))
}

/// Presets that are smaller than the original, in KB.
pub fn available_presets(original_size: u64) -> Vec<u64> {
    let original_kb = original_size_kb(original_size);
    PRESET_TARGETS_KB
        .iter()
        .copied()
        .filter(|&kb| kb < original_kb)
        .collect()
}

/// Human-readable size: `"512 B"`, `"1.5 KB"`, `"2.25 MB"`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

/// How much smaller `compressed` is than `original`, in percent with one decimal.
pub fn reduction_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let percent = (1.0 - compressed as f64 / original as f64) * 100.0;
    (percent * 10.0).round() / 10.0
}

//! Upload form helpers.
//!
//! Checks the form runs before compressing, plus the size formatting it
//! displays. All of them are thin wrappers over `squish_core::validate`.

use squish_core::validate;
use wasm_bindgen::prelude::*;

/// Check an upload's size and type.
///
/// Returns the MIME type the compressed file will have, or an error
/// message suitable for showing to the user.
#[wasm_bindgen]
pub fn validate_upload(bytes: &[u8]) -> Result<String, JsValue> {
    validate::validate_upload(bytes)
        .map(|format| format.mime_type().to_string())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Preset targets (KB) that are smaller than an upload of `original_size` bytes.
#[wasm_bindgen]
pub fn preset_targets(original_size: usize) -> Vec<u32> {
    validate::available_presets(original_size as u64)
        .into_iter()
        .map(|kb| kb as u32)
        .collect()
}

/// Largest target the form accepts for an upload of `original_size` bytes.
#[wasm_bindgen]
pub fn max_target_kb(original_size: usize) -> u32 {
    validate::original_size_kb(original_size as u64).saturating_sub(1) as u32
}

/// Human-readable size, e.g. `"1.5 KB"`.
#[wasm_bindgen]
pub fn format_size(bytes: usize) -> String {
    validate::format_size(bytes as u64)
}

/// Largest accepted upload in bytes.
#[wasm_bindgen]
pub fn max_upload_bytes() -> usize {
    validate::MAX_UPLOAD_BYTES as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_targets() {
        assert_eq!(preset_targets(3_000_000), vec![100, 500, 1000, 2000]);
        assert_eq!(preset_targets(300 * 1024), vec![100]);
    }

    #[test]
    fn test_max_target_kb() {
        assert_eq!(max_target_kb(2_000_000), 1953);
        assert_eq!(max_target_kb(1024), 0);
        assert_eq!(max_target_kb(0), 0);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
    }

    #[test]
    fn test_max_upload_bytes() {
        assert_eq!(max_upload_bytes(), 10 * 1024 * 1024);
    }
}

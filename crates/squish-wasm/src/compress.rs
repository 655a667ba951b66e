//! Compression WASM bindings.
//!
//! Exposes the one-shot pipeline from `squish_core::compress` to the upload
//! form: validate, decode, search and hand back a [`JsCompressed`].
//!
//! # Example
//!
//! ```typescript
//! import { compress_to_target } from '@squish/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = compress_to_target(bytes, file.name, 500, false);
//! const blob = new Blob([result.bytes()], { type: result.mime_type });
//! ```

use crate::types::{JsCompressed, JsSearchConfig};
use squish_core::{compress_upload, CompressError, SearchConfig};
use wasm_bindgen::prelude::*;

/// Compress an uploaded JPEG or PNG to at most `target_kb` kilobytes.
///
/// # Arguments
///
/// * `bytes` - The uploaded file as a `Uint8Array`
/// * `file_name` - Original file name, used for the download name
/// * `target_kb` - Target size in KB (1 KB = 1024 bytes)
/// * `allow_downscale` - Reduce resolution when quality alone can't reach the target
///
/// # Errors
///
/// Returns an error if:
/// - The file is empty, larger than 10 MB, or not a JPEG/PNG
/// - The target is 0 or not smaller than the original
/// - The image can't be decoded
/// - No encoding smaller than the original exists
#[wasm_bindgen]
pub fn compress_to_target(
    bytes: &[u8],
    file_name: Option<String>,
    target_kb: u32,
    allow_downscale: bool,
) -> Result<JsCompressed, JsValue> {
    let mut config = SearchConfig::default();
    config.scale_fallback = allow_downscale;
    run(bytes, file_name.as_deref(), target_kb, allow_downscale, &config).map_err(to_js_error)
}

/// Same as [`compress_to_target`], with a custom search policy.
///
/// The resolution fallback still requires `allow_downscale`.
#[wasm_bindgen]
pub fn compress_with_config(
    bytes: &[u8],
    file_name: Option<String>,
    target_kb: u32,
    allow_downscale: bool,
    config: &JsSearchConfig,
) -> Result<JsCompressed, JsValue> {
    run(bytes, file_name.as_deref(), target_kb, allow_downscale, config.inner()).map_err(to_js_error)
}

fn run(
    bytes: &[u8],
    file_name: Option<&str>,
    target_kb: u32,
    allow_downscale: bool,
    config: &SearchConfig,
) -> Result<JsCompressed, CompressError> {
    let compressed = compress_upload(bytes, u64::from(target_kb), allow_downscale, config)?;

    #[cfg(target_arch = "wasm32")]
    web_sys::console::debug_1(&JsValue::from_str(&format!(
        "squish: {} -> {} bytes in {} encodes",
        compressed.original_size(),
        compressed.byte_size(),
        compressed.oracle_calls()
    )));

    Ok(JsCompressed::new(compressed, file_name))
}

fn to_js_error(err: CompressError) -> JsValue {
    let message = JsValue::from_str(&err.to_string());
    web_sys::console::error_1(&message);
    message
}

/// Tests for compress bindings.
///
/// Functions returning `Result<T, JsValue>` only work on wasm32 targets, so
/// the native tests go through `run`.
#[cfg(test)]
mod tests {
    use super::*;
    use squish_core::decode::PixelLayout;
    use squish_core::encode::{encode_jpeg, encode_png};
    use squish_core::validate::ValidationError;

    fn noisy(width: u32, height: u32, channels: usize) -> Vec<u8> {
        (0..width * height * channels as u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
            .collect()
    }

    #[test]
    fn test_run_jpeg() {
        let upload = encode_jpeg(&noisy(128, 128, 3), 128, 128, 95).unwrap();
        let target_kb = (upload.len() / 1024 / 2) as u32;

        let result = run(&upload, Some("photo.jpg"), target_kb, false, &SearchConfig::default()).unwrap();

        assert!(result.byte_size() <= target_kb as usize * 1024);
        assert_eq!(result.download_name(), "compressed-photo.jpg");
        assert_eq!(result.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_run_png_keeps_format() {
        let upload = encode_png(&noisy(96, 96, 3), 96, 96, PixelLayout::Rgb8, 100).unwrap();
        let target_kb = (upload.len() * 7 / 10 / 1024) as u32;

        let result = run(&upload, Some("art.png"), target_kb, false, &SearchConfig::default()).unwrap();

        assert_eq!(result.mime_type(), "image/png");
        assert_eq!(result.download_name(), "compressed-art.png");
    }

    #[test]
    fn test_run_rejects_zero_target() {
        let upload = encode_jpeg(&noisy(16, 16, 3), 16, 16, 90).unwrap();
        let result = run(&upload, None, 0, false, &SearchConfig::default());

        assert!(matches!(
            result,
            Err(CompressError::Validation(ValidationError::ZeroTarget))
        ));
    }
}

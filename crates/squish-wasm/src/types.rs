//! WASM-compatible wrapper types.
//!
//! These wrap the core Squish types and expose them to JavaScript through
//! getters, so the upload form can show sizes and offer the download.

use serde::Serialize;
use squish_core::{download_name, format_size, Compressed, Fit, SearchConfig};
use wasm_bindgen::prelude::*;

/// A compressed upload, ready to be offered as a download.
///
/// # Memory Management
///
/// The encoded bytes live in WASM memory. `bytes()` copies them into a
/// JavaScript `Uint8Array`; call it once and wrap the result in a `Blob`.
#[wasm_bindgen]
pub struct JsCompressed {
    inner: Compressed,
    download_name: String,
}

impl JsCompressed {
    pub(crate) fn new(inner: Compressed, file_name: Option<&str>) -> Self {
        Self {
            inner,
            download_name: download_name(file_name),
        }
    }
}

#[wasm_bindgen]
impl JsCompressed {
    /// Size of the compressed file in bytes
    #[wasm_bindgen(getter)]
    pub fn byte_size(&self) -> usize {
        self.inner.payload().len()
    }

    /// Size of the uploaded file in bytes
    #[wasm_bindgen(getter)]
    pub fn original_size(&self) -> usize {
        self.inner.original_size() as usize
    }

    /// Output width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Output height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Chosen encoder quality (0-1)
    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> f32 {
        self.inner.quality()
    }

    /// Chosen scale (1.0 means full resolution)
    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f32 {
        self.inner.scale()
    }

    /// Number of encodes the search performed
    #[wasm_bindgen(getter)]
    pub fn oracle_calls(&self) -> u32 {
        self.inner.oracle_calls()
    }

    /// False when only a result over the target could be produced
    #[wasm_bindgen(getter)]
    pub fn under_budget(&self) -> bool {
        self.inner.fit() == Fit::UnderBudget
    }

    /// MIME type for the download `Blob`
    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.inner.mime_type().to_string()
    }

    /// Suggested file name, `compressed-<original name>`
    #[wasm_bindgen(getter)]
    pub fn download_name(&self) -> String {
        self.download_name.clone()
    }

    /// Percent saved relative to the upload, one decimal
    #[wasm_bindgen(getter)]
    pub fn reduction_percent(&self) -> f64 {
        self.inner.reduction_percent()
    }

    /// Returns the compressed file as a Uint8Array (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.payload().to_vec()
    }

    /// Plain object with the display values, for state stores.
    pub fn summary(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.to_summary()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl JsCompressed {
    fn to_summary(&self) -> CompressionSummary {
        CompressionSummary {
            original_size: format_size(self.inner.original_size()),
            compressed_size: format_size(self.inner.byte_size()),
            reduction_percent: self.inner.reduction_percent(),
            download_name: self.download_name.clone(),
            mime_type: self.inner.mime_type(),
            under_budget: self.under_budget(),
        }
    }
}

/// Display values shown after a compression.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompressionSummary {
    original_size: String,
    compressed_size: String,
    reduction_percent: f64,
    download_name: String,
    mime_type: &'static str,
    under_budget: bool,
}

/// Search policy wrapper for JavaScript
#[wasm_bindgen]
pub struct JsSearchConfig {
    inner: SearchConfig,
}

#[wasm_bindgen]
impl JsSearchConfig {
    /// Create a policy with the default settings
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: SearchConfig::default(),
        }
    }

    /// Get the size tolerance (fraction of the target)
    #[wasm_bindgen(getter)]
    pub fn tolerance(&self) -> f32 {
        self.inner.tolerance
    }

    /// Set the size tolerance
    #[wasm_bindgen(setter)]
    pub fn set_tolerance(&mut self, value: f32) {
        self.inner.tolerance = value;
    }

    /// Get the maximum number of encodes
    #[wasm_bindgen(getter)]
    pub fn max_oracle_calls(&self) -> u32 {
        self.inner.max_oracle_calls
    }

    /// Set the maximum number of encodes
    #[wasm_bindgen(setter)]
    pub fn set_max_oracle_calls(&mut self, value: u32) {
        self.inner.max_oracle_calls = value;
    }

    /// Get the highest quality tried
    #[wasm_bindgen(getter)]
    pub fn max_quality(&self) -> f32 {
        self.inner.max_quality
    }

    /// Set the highest quality tried
    #[wasm_bindgen(setter)]
    pub fn set_max_quality(&mut self, value: f32) {
        self.inner.max_quality = value;
    }

    /// Get whether the resolution fallback is enabled
    #[wasm_bindgen(getter)]
    pub fn scale_fallback(&self) -> bool {
        self.inner.scale_fallback
    }

    /// Enable or disable the resolution fallback
    #[wasm_bindgen(setter)]
    pub fn set_scale_fallback(&mut self, value: bool) {
        self.inner.scale_fallback = value;
    }

    /// Get the smallest scale the fallback may use
    #[wasm_bindgen(getter)]
    pub fn min_scale(&self) -> f32 {
        self.inner.min_scale
    }

    /// Set the smallest scale the fallback may use
    #[wasm_bindgen(setter)]
    pub fn set_min_scale(&mut self, value: f32) {
        self.inner.min_scale = value;
    }

    /// Serialize to JSON for storage
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Deserialize from JSON. Missing fields take their defaults.
    pub fn from_json(value: JsValue) -> Result<JsSearchConfig, JsValue> {
        let inner: SearchConfig =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { inner })
    }
}

impl Default for JsSearchConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl JsSearchConfig {
    pub(crate) fn inner(&self) -> &SearchConfig {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squish_core::compress_to_target;
    use squish_core::encode::encode_jpeg;
    use squish_core::TargetSpec;

    fn compressed_gradient() -> Compressed {
        let mut pixels = Vec::with_capacity(64 * 64 * 3);
        for y in 0..64u32 {
            for x in 0..64u32 {
                pixels.extend_from_slice(&[(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8]);
            }
        }
        let upload = encode_jpeg(&pixels, 64, 64, 100).unwrap();
        let budget = upload.len() as u64 / 2;
        compress_to_target(&upload, &TargetSpec::new(budget), &SearchConfig::default()).unwrap()
    }

    #[test]
    fn test_js_compressed_getters() {
        let compressed = JsCompressed::new(compressed_gradient(), Some("cat.jpg"));

        assert_eq!(compressed.download_name(), "compressed-cat.jpg");
        assert_eq!(compressed.mime_type(), "image/jpeg");
        assert_eq!(compressed.bytes().len(), compressed.byte_size());
        assert!(compressed.byte_size() < compressed.original_size());
        assert_eq!((compressed.width(), compressed.height()), (64, 64));
        assert!(compressed.under_budget());
        assert!(compressed.reduction_percent() >= 50.0);
    }

    #[test]
    fn test_summary_uses_display_sizes() {
        let compressed = JsCompressed::new(compressed_gradient(), None);
        let summary = compressed.to_summary();

        assert_eq!(summary.download_name, "compressed-image.jpg");
        assert_eq!(summary.compressed_size, format_size(compressed.byte_size() as u64));
        assert!(summary.under_budget);
    }

    #[test]
    fn test_search_config_setters() {
        let mut config = JsSearchConfig::new();
        assert_eq!(config.inner(), &SearchConfig::default());

        config.set_tolerance(0.05);
        config.set_max_oracle_calls(20);
        config.set_scale_fallback(true);
        config.set_min_scale(0.5);
        config.set_max_quality(0.9);

        assert_eq!(config.tolerance(), 0.05);
        assert_eq!(config.max_oracle_calls(), 20);
        assert!(config.scale_fallback());
        assert_eq!(config.min_scale(), 0.5);
        assert_eq!(config.max_quality(), 0.9);
        assert!(config.inner().validate().is_ok());
    }
}

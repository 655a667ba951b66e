//! Squish WASM - WebAssembly bindings for Squish
//!
//! This crate exposes the squish-core compression pipeline to the browser
//! upload form.
//!
//! # Module Structure
//!
//! - `compress` - Compress an upload toward a target size
//! - `validate` - Upload checks, presets and size formatting
//! - `types` - WASM-compatible wrapper types for results and search settings
//!
//! # Usage
//!
//! ```typescript
//! import init, { validate_upload, compress_to_target } from '@squish/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! validate_upload(bytes);
//! const result = compress_to_target(bytes, file.name, 500, false);
//! console.log(`${result.reduction_percent}% smaller`);
//! ```

use wasm_bindgen::prelude::*;

mod compress;
mod types;
mod validate;

// Re-export public types
pub use compress::{compress_to_target, compress_with_config};
pub use types::{JsCompressed, JsSearchConfig};
pub use validate::{format_size, max_target_kb, max_upload_bytes, preset_targets, validate_upload};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

//! Size-targeting search.
//!
//! Finds encoder parameters whose output is as large as possible without
//! exceeding a byte budget, using a bounded number of oracle calls.
//!
//! # Algorithm
//!
//! 1. Bisect quality over `[min_quality, max_quality]` at full resolution.
//!    Each probe lands on the midpoint of the current bracket; under-budget
//!    results raise the floor, over-budget results lower the ceiling.
//! 2. A pass ends when the bracket is narrower than the convergence
//!    threshold, an under-budget result is within tolerance of the budget,
//!    the per-pass iteration cap is reached, the global call cap is reached,
//!    or the oracle declines.
//! 3. If nothing fit and downscaling is allowed, try scales
//!    `1 - k * scale_step` down to `min_scale`. Each scale is probed once at
//!    `min_quality`; a scale whose floor is still over budget is skipped, and
//!    the first one that fits is bisected like the full-resolution pass.
//! 4. Pick the largest under-budget result, else the smallest over-budget
//!    one (flagged [`Fit::ClosestOver`]). A result larger than the original
//!    upload is never returned.
//!
//! All state lives in one call, so dropping an in-flight search is always safe.
//!
//! # Example
//!
//! ```ignore
//! use squish_core::decode::decode_image;
//! use squish_core::oracle::ImageOracle;
//! use squish_core::search::{search, SearchConfig, TargetSpec};
//!
//! let image = decode_image(&std::fs::read("photo.jpg")?)?;
//! let mut oracle = ImageOracle::new(&image);
//! let outcome = search(&image, &TargetSpec::from_kb(500), &SearchConfig::default(), &mut oracle)?;
//! println!("{} bytes at q={}", outcome.byte_size(), outcome.params().quality());
//! ```

mod bisect;
mod types;

use tracing::debug;

use crate::decode::SourceImage;
use crate::oracle::EncodeOracle;
use bisect::{bisect_quality, probe_floor, CallBudget, Candidates, PassEnd};

pub use types::{
    EncodeParams, EncodeResult, Fit, SearchConfig, SearchError, SearchOutcome, TargetSpec,
};

/// Search for the encoding of `image` that best fits `target`.
///
/// # Errors
///
/// - `SearchError::InvalidInput` if the budget is zero or not smaller than the
///   original size, or if `config` is malformed. The oracle is not called.
/// - `SearchError::OracleUnavailable` if the oracle never produced a result.
/// - `SearchError::TargetUnreachable` if the best result found is larger than
///   the original upload.
pub fn search<O>(
    image: &SourceImage,
    target: &TargetSpec,
    config: &SearchConfig,
    oracle: &mut O,
) -> Result<SearchOutcome, SearchError>
where
    O: EncodeOracle + ?Sized,
{
    config.validate()?;
    validate_target(image, target)?;

    let budget = target.byte_budget;
    let mut calls = CallBudget::new(config.max_oracle_calls);
    let mut candidates = Candidates::default();

    let mut end = bisect_quality(oracle, 1.0, budget, config, &mut calls, &mut candidates);
    debug!(scale = 1.0, ?end, calls = calls.used(), "quality pass finished");

    let downscale = config.scale_fallback && !target.preserve_resolution;
    if downscale && !candidates.has_under() && end.allows_more() {
        for scale in scale_ladder(config) {
            end = match probe_floor(oracle, scale, budget, config, &mut calls, &mut candidates) {
                Some(end) => end,
                None => bisect_quality(oracle, scale, budget, config, &mut calls, &mut candidates),
            };
            debug!(scale, ?end, calls = calls.used(), "quality pass finished");

            if candidates.has_under() || !end.allows_more() {
                break;
            }
        }
    }

    select(candidates, end, calls.used(), image.original_size())
}

/// Scales tried by the resolution fallback, largest first.
///
/// `1 - k * step` for k = 1, 2, ... while the scale stays at or above
/// `min_scale`. Values are rounded to 4 decimals to keep f32 drift out.
pub fn scale_ladder(config: &SearchConfig) -> impl Iterator<Item = f32> {
    let step = config.scale_step;
    let floor = config.min_scale;
    (1u32..)
        .map(move |k| ((1.0 - k as f32 * step) * 10_000.0).round() / 10_000.0)
        .take_while(move |&scale| scale > 0.0 && scale >= floor - 1e-6)
}

fn validate_target(image: &SourceImage, target: &TargetSpec) -> Result<(), SearchError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(SearchError::InvalidInput(format!(
            "image must be at least 1x1, got {}x{}",
            image.width(),
            image.height()
        )));
    }
    if target.byte_budget == 0 {
        return Err(SearchError::InvalidInput(
            "target size must be greater than zero".to_string(),
        ));
    }
    if target.byte_budget >= image.original_size() {
        return Err(SearchError::InvalidInput(format!(
            "target size {} must be smaller than the original size {}",
            target.byte_budget,
            image.original_size()
        )));
    }
    Ok(())
}

fn select(
    candidates: Candidates,
    end: PassEnd,
    oracle_calls: u32,
    original_size: u64,
) -> Result<SearchOutcome, SearchError> {
    let Some((probe, fit)) = candidates.into_choice() else {
        return Err(if end == PassEnd::OracleDeclined {
            SearchError::OracleUnavailable { oracle_calls }
        } else {
            SearchError::TargetUnreachable {
                closest_size: None,
                oracle_calls,
            }
        });
    };

    let size = probe.result.byte_size();
    if size > original_size {
        debug!(size, original_size, "best candidate is larger than the original");
        return Err(SearchError::TargetUnreachable {
            closest_size: Some(size),
            oracle_calls,
        });
    }

    debug!(
        size,
        quality = probe.params.quality(),
        scale = probe.params.scale(),
        ?fit,
        oracle_calls,
        "search finished"
    );
    Ok(SearchOutcome::new(probe.params, probe.result, oracle_calls, fit))
}

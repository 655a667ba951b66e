//! Value types exchanged between the search, its oracle, and its caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by the size-targeting search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// Malformed target, image, or configuration. Rejected before any oracle call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The encoder never produced output.
    #[error("Encoder produced no output after {oracle_calls} call(s)")]
    OracleUnavailable { oracle_calls: u32 },

    /// No acceptable candidate was found within the call and scale budgets.
    #[error("Could not compress image to target size")]
    TargetUnreachable {
        /// Smallest size seen, if the encoder produced anything at all.
        closest_size: Option<u64>,
        oracle_calls: u32,
    },
}

/// One point in encoder parameter space.
///
/// Both fields are guaranteed to lie in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParams {
    quality: f32,
    scale: f32,
}

impl EncodeParams {
    /// Create a parameter vector, rejecting values outside (0, 1].
    pub fn new(quality: f32, scale: f32) -> Result<Self, SearchError> {
        if !in_unit_interval(quality) {
            return Err(SearchError::InvalidInput(format!(
                "quality must be in (0, 1], got {quality}"
            )));
        }
        if !in_unit_interval(scale) {
            return Err(SearchError::InvalidInput(format!(
                "scale must be in (0, 1], got {scale}"
            )));
        }
        Ok(Self { quality, scale })
    }

    /// Full-resolution parameters at the given quality.
    pub fn full_resolution(quality: f32) -> Result<Self, SearchError> {
        Self::new(quality, 1.0)
    }

    /// Caller guarantees both values are in (0, 1].
    pub(crate) fn from_parts(quality: f32, scale: f32) -> Self {
        debug_assert!(in_unit_interval(quality) && in_unit_interval(scale));
        Self { quality, scale }
    }

    /// Encoder fidelity in (0, 1].
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Linear downscale factor in (0, 1].
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

fn in_unit_interval(value: f32) -> bool {
    value.is_finite() && value > 0.0 && value <= 1.0
}

/// Output of one oracle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeResult {
    byte_size: u64,
    payload: Vec<u8>,
}

impl EncodeResult {
    /// Wrap an encoded blob; its size is the payload length.
    pub fn from_payload(payload: Vec<u8>) -> Self {
        Self {
            byte_size: payload.len() as u64,
            payload,
        }
    }

    /// A result whose size is reported separately from its payload.
    ///
    /// Useful for oracles backed by an external encoder (e.g. a browser
    /// canvas) that report a blob size but hand back a handle or nothing.
    pub fn with_reported_size(byte_size: u64, payload: Vec<u8>) -> Self {
        Self { byte_size, payload }
    }

    /// Encoded size in bytes.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// The encoded bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the encoded bytes.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Requested maximum size in bytes.
    pub byte_budget: u64,
    /// When set, the resolution fallback is never used.
    pub preserve_resolution: bool,
}

impl TargetSpec {
    /// Target `byte_budget` bytes at full resolution.
    pub fn new(byte_budget: u64) -> Self {
        Self {
            byte_budget,
            preserve_resolution: true,
        }
    }

    /// Target a size given in kilobytes (1 KB = 1024 bytes).
    pub fn from_kb(kb: u64) -> Self {
        Self::new(kb.saturating_mul(1024))
    }

    /// Let the search reduce resolution if quality alone can't reach the budget.
    pub fn allow_downscale(mut self) -> Self {
        self.preserve_resolution = false;
        self
    }
}

/// Tunable search policy.
///
/// `Default` is the reference policy: quality-only bisection over
/// [0.001, 0.95], 2% tolerance, at most 100 encoder calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Lower end of the quality bracket.
    pub min_quality: f32,
    /// Upper end of the quality bracket. Kept below 1.0 on purpose.
    pub max_quality: f32,
    /// Probes per scale pass.
    pub max_iterations: u32,
    /// Hard cap on oracle calls across the whole search.
    pub max_oracle_calls: u32,
    /// Stop a pass once the quality bracket is narrower than this.
    pub convergence_threshold: f32,
    /// Stop once an under-budget result is within this fraction of the budget.
    pub tolerance: f32,
    /// Allow reducing resolution when quality alone can't reach the budget.
    pub scale_fallback: bool,
    /// Scale decrement between fallback passes.
    pub scale_step: f32,
    /// Smallest scale the fallback will try.
    pub min_scale: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_quality: 0.001,
            max_quality: 0.95,
            max_iterations: 50,
            max_oracle_calls: 100,
            convergence_threshold: 1e-4,
            tolerance: 0.02,
            scale_fallback: false,
            scale_step: 0.1,
            min_scale: 0.1,
        }
    }
}

impl SearchConfig {
    /// Reference policy with the resolution fallback switched on.
    pub fn with_scale_fallback() -> Self {
        Self {
            scale_fallback: true,
            ..Self::default()
        }
    }

    /// Check that the policy describes a bounded, well-formed search.
    pub fn validate(&self) -> Result<(), SearchError> {
        let invalid = |msg: String| Err(SearchError::InvalidInput(msg));

        if !in_unit_interval(self.min_quality) || !in_unit_interval(self.max_quality) {
            return invalid(format!(
                "quality bracket [{}, {}] must lie in (0, 1]",
                self.min_quality, self.max_quality
            ));
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return invalid(format!(
                "convergence threshold must be a non-negative number, got {}",
                self.convergence_threshold
            ));
        }
        if self.max_quality - self.min_quality <= self.convergence_threshold {
            return invalid(format!(
                "quality bracket [{}, {}] is narrower than the convergence threshold {}",
                self.min_quality, self.max_quality, self.convergence_threshold
            ));
        }
        if self.max_iterations == 0 || self.max_oracle_calls == 0 {
            return invalid("iteration and call caps must be at least 1".to_string());
        }
        if !self.tolerance.is_finite() || !(0.0..1.0).contains(&self.tolerance) {
            return invalid(format!("tolerance must be in [0, 1), got {}", self.tolerance));
        }
        if !self.scale_step.is_finite() || self.scale_step <= 0.0 || self.scale_step >= 1.0 {
            return invalid(format!("scale step must be in (0, 1), got {}", self.scale_step));
        }
        if !in_unit_interval(self.min_scale) {
            return invalid(format!("minimum scale must be in (0, 1], got {}", self.min_scale));
        }
        Ok(())
    }
}

/// How the chosen result relates to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fit {
    /// At or under the budget.
    UnderBudget,
    /// Nothing fit; this is the smallest over-budget result seen.
    ClosestOver,
}

/// The result of a successful search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    params: EncodeParams,
    result: EncodeResult,
    oracle_calls: u32,
    fit: Fit,
}

impl SearchOutcome {
    pub(crate) fn new(params: EncodeParams, result: EncodeResult, oracle_calls: u32, fit: Fit) -> Self {
        Self {
            params,
            result,
            oracle_calls,
            fit,
        }
    }

    /// Parameters that produced the chosen result.
    pub fn params(&self) -> EncodeParams {
        self.params
    }

    /// The chosen encoded result.
    pub fn result(&self) -> &EncodeResult {
        &self.result
    }

    /// Size of the chosen result in bytes.
    pub fn byte_size(&self) -> u64 {
        self.result.byte_size()
    }

    /// Number of oracle calls the search made.
    pub fn oracle_calls(&self) -> u32 {
        self.oracle_calls
    }

    /// Whether the result fits the budget or is the closest miss.
    pub fn fit(&self) -> Fit {
        self.fit
    }

    /// Shorthand for `fit() == Fit::UnderBudget`.
    pub fn is_under_budget(&self) -> bool {
        self.fit == Fit::UnderBudget
    }

    /// Take ownership of the chosen result.
    pub fn into_result(self) -> EncodeResult {
        self.result
    }
}

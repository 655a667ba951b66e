//! One bounded bisection pass over quality at a fixed scale.

use tracing::trace;

use super::{EncodeParams, EncodeResult, Fit, SearchConfig};
use crate::oracle::EncodeOracle;

/// A probed parameter vector together with what the oracle returned.
#[derive(Debug, Clone)]
pub(crate) struct Probe {
    pub(crate) params: EncodeParams,
    pub(crate) result: EncodeResult,
}

/// Best candidates seen so far on each side of the budget.
#[derive(Debug, Default)]
pub(crate) struct Candidates {
    /// Largest result at or under the budget.
    under: Option<Probe>,
    /// Smallest result over the budget.
    over: Option<Probe>,
}

impl Candidates {
    pub(crate) fn record(&mut self, probe: Probe, budget: u64) {
        let size = probe.result.byte_size();
        if size <= budget {
            if self.under.as_ref().is_none_or(|best| size > best.result.byte_size()) {
                self.under = Some(probe);
            }
        } else if self.over.as_ref().is_none_or(|best| size < best.result.byte_size()) {
            self.over = Some(probe);
        }
    }

    pub(crate) fn has_under(&self) -> bool {
        self.under.is_some()
    }

    /// Best under-budget probe, else the closest over-budget one.
    pub(crate) fn into_choice(self) -> Option<(Probe, Fit)> {
        match (self.under, self.over) {
            (Some(under), _) => Some((under, Fit::UnderBudget)),
            (None, Some(over)) => Some((over, Fit::ClosestOver)),
            (None, None) => None,
        }
    }
}

/// Oracle call accounting shared by every pass of one search.
#[derive(Debug)]
pub(crate) struct CallBudget {
    used: u32,
    cap: u32,
}

impl CallBudget {
    pub(crate) fn new(cap: u32) -> Self {
        Self { used: 0, cap }
    }

    /// Reserve one call; false once the cap is reached.
    fn try_take(&mut self) -> bool {
        if self.used >= self.cap {
            return false;
        }
        self.used += 1;
        true
    }

    pub(crate) fn used(&self) -> u32 {
        self.used
    }
}

/// Why a pass stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassEnd {
    /// The quality bracket became narrower than the convergence threshold.
    Converged,
    /// An under-budget result landed within tolerance of the budget.
    WithinTolerance,
    /// The per-pass iteration cap was hit.
    IterationsExhausted,
    /// The global call cap was hit.
    CallsExhausted,
    /// The oracle returned no result.
    OracleDeclined,
    /// Even the lowest quality was over budget at this scale.
    FloorOverBudget,
}

impl PassEnd {
    /// Whether another pass may still run after this one.
    pub(crate) fn allows_more(self) -> bool {
        !matches!(self, PassEnd::CallsExhausted | PassEnd::OracleDeclined)
    }
}

/// Whether `size` (already known to be at or under `budget`) is close enough.
///
/// The tolerance is snapped to 6 decimals first so `0.02f32` means 2% exactly.
pub(crate) fn within_tolerance(size: u64, budget: u64, tolerance: f32) -> bool {
    let tolerance = (f64::from(tolerance) * 1e6).round() / 1e6;
    let shortfall = budget.saturating_sub(size) as f64;
    shortfall <= budget as f64 * tolerance
}

/// Probe the lowest quality at `scale` once.
///
/// Returns `None` when that probe fit the budget but is not yet within
/// tolerance, so bisecting this scale is worthwhile. Any other outcome ends
/// the pass without bisecting.
pub(crate) fn probe_floor<O>(
    oracle: &mut O,
    scale: f32,
    budget: u64,
    config: &SearchConfig,
    calls: &mut CallBudget,
    candidates: &mut Candidates,
) -> Option<PassEnd>
where
    O: EncodeOracle + ?Sized,
{
    if !calls.try_take() {
        return Some(PassEnd::CallsExhausted);
    }

    let params = EncodeParams::from_parts(config.min_quality, scale);
    let Some(result) = oracle.encode(params) else {
        trace!(scale, "oracle declined floor probe");
        return Some(PassEnd::OracleDeclined);
    };

    let size = result.byte_size();
    trace!(quality = config.min_quality, scale, size, budget, "floor probe");
    candidates.record(Probe { params, result }, budget);

    if size > budget {
        Some(PassEnd::FloorOverBudget)
    } else if within_tolerance(size, budget, config.tolerance) {
        Some(PassEnd::WithinTolerance)
    } else {
        None
    }
}

/// Bisect quality at `scale`, recording every probe into `candidates`.
///
/// Under-budget results raise the lower bound, over-budget results lower the
/// upper bound. Each probe sits at the midpoint of the current bracket.
pub(crate) fn bisect_quality<O>(
    oracle: &mut O,
    scale: f32,
    budget: u64,
    config: &SearchConfig,
    calls: &mut CallBudget,
    candidates: &mut Candidates,
) -> PassEnd
where
    O: EncodeOracle + ?Sized,
{
    let (mut low, mut high) = (config.min_quality, config.max_quality);

    for _ in 0..config.max_iterations {
        if high - low < config.convergence_threshold {
            return PassEnd::Converged;
        }
        if !calls.try_take() {
            return PassEnd::CallsExhausted;
        }

        let quality = low + (high - low) / 2.0;
        let params = EncodeParams::from_parts(quality, scale);
        let Some(result) = oracle.encode(params) else {
            trace!(quality, scale, "oracle declined");
            return PassEnd::OracleDeclined;
        };

        let size = result.byte_size();
        let under = size <= budget;
        trace!(quality, scale, size, budget, under, "probe");

        candidates.record(Probe { params, result }, budget);

        if under {
            low = quality;
            if within_tolerance(size, budget, config.tolerance) {
                return PassEnd::WithinTolerance;
            }
        } else {
            high = quality;
        }
    }

    PassEnd::IterationsExhausted
}

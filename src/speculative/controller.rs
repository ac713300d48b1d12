//! Adaptive speculative depth controller.
//!
//! Chooses how many tokens to draft before each verify step, per request,
//! from an online estimate of that request's acceptance rate.
//!
//! ## Decision rule
//!
//! 1. `d_cap = min(max_depth, ops_cap)`; if `d_cap == 0`, never speculate.
//! 2. No feedback yet: speculate at `d_cap`.
//! 3. No-regret gating: if `alpha_hat <= c`, return 0.
//! 4. Otherwise pick the depth in `0..=d_cap` maximizing `S(d, alpha_hat)`.
//!
//! ## Example
//!
//! ```
//! use spec_depth::{DepthConfig, DepthController};
//!
//! let mut controller = DepthController::new(DepthConfig::new(4).cost_ratio(0.3));
//!
//! // Cold start speculates at the cap.
//! assert_eq!(controller.decide_depth("req-1"), 4);
//!
//! // Poor acceptance disables speculation.
//! controller.record_outcome("req-1", 10, 2);
//! assert_eq!(controller.decide_depth("req-1"), 0);
//!
//! // Drop state once the request completes.
//! controller.remove_request("req-1");
//! assert_eq!(controller.decide_depth("req-1"), 4);
//! ```

use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::{debug, trace};

use super::speedup::{ops_depth_cap, SpeedupModel, NO_SPEEDUP};
use super::stats::RequestStats;
use crate::config::DepthConfig;

/// Why a depth was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionReason {
    /// `max_depth` or the ops budget leaves no room to speculate.
    CapExhausted,
    /// No feedback recorded yet; speculate at the cap.
    ColdStart,
    /// Acceptance rate at or below the cost ratio.
    Gated,
    /// Chosen by maximizing the speedup model.
    Optimized,
}

impl DecisionReason {
    /// Get the reason name as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CapExhausted => "CapExhausted",
            Self::ColdStart => "ColdStart",
            Self::Gated => "Gated",
            Self::Optimized => "Optimized",
        }
    }
}

/// Outcome of a depth decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthDecision {
    /// Number of tokens to draft.
    pub depth: usize,
    /// Why this depth was chosen.
    pub reason: DecisionReason,
    /// Model speedup at `depth`; `1.0` unless `reason` is `Optimized`.
    pub speedup: f64,
}

impl DepthDecision {
    fn fixed(depth: usize, reason: DecisionReason) -> Self {
        Self {
            depth,
            reason,
            speedup: NO_SPEEDUP,
        }
    }
}

/// Per-request adaptive depth controller.
///
/// Holds no locks: calls for the same request must be serialized by the
/// caller. State for distinct requests is independent.
#[derive(Debug)]
pub struct DepthController {
    /// Sanitized configuration.
    config: DepthConfig,
    /// Speedup model built from the cost coefficients.
    model: SpeedupModel,
    /// Effective depth cap, `min(max_depth, ops_cap)`.
    d_cap: usize,
    /// Request id -> acceptance statistics.
    requests: LruCache<String, RequestStats>,
}

impl DepthController {
    /// Create a controller. Out-of-domain options are coerced, never rejected.
    pub fn new(config: DepthConfig) -> Self {
        let config = config.sanitized();
        let model = SpeedupModel::from_costs(config.cost_ratio, config.verify_growth);

        let ops_cap = ops_depth_cap(config.ops_budget, config.overhead_factor);
        let d_cap = ops_cap.map_or(config.max_depth, |cap| cap.min(config.max_depth));

        let requests = match config.max_tracked_requests.and_then(NonZeroUsize::new) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };

        debug!(
            max_depth = config.max_depth,
            ?ops_cap,
            d_cap,
            a = model.a(),
            b = model.b(),
            "depth controller created"
        );

        Self {
            config,
            model,
            d_cap,
            requests,
        }
    }

    /// Record the outcome of a speculative step.
    ///
    /// `drafted == 0` is a no-op. `accepted <= drafted` is expected but not
    /// checked; the acceptance fraction is clamped to `[0, 1]`.
    pub fn record_outcome(&mut self, request_id: &str, drafted: u64, accepted: u64) {
        if drafted == 0 {
            return;
        }
        let beta = self.config.ema_weight;

        if let Some(stats) = self.requests.get_mut(request_id) {
            stats.observe(drafted, accepted, beta);
            trace!(request_id, drafted, accepted, alpha_hat = ?stats.alpha_hat(), "updated");
            return;
        }

        let mut stats = RequestStats::new();
        stats.observe(drafted, accepted, beta);
        trace!(request_id, drafted, accepted, alpha_hat = ?stats.alpha_hat(), "tracking");
        if let Some((evicted, _)) = self.requests.push(request_id.to_string(), stats) {
            debug!(evicted = %evicted, "request state evicted at capacity");
        }
    }

    /// Number of tokens to draft for the next step of `request_id`.
    ///
    /// Always within `0..=max_depth`.
    pub fn decide_depth(&self, request_id: &str) -> usize {
        self.decide(request_id).depth
    }

    /// Like [`decide_depth`](Self::decide_depth), with the reason attached.
    pub fn decide(&self, request_id: &str) -> DepthDecision {
        let decision = self.decide_inner(request_id);
        trace!(
            request_id,
            depth = decision.depth,
            reason = decision.reason.as_str(),
            speedup = decision.speedup,
            "depth decided"
        );
        decision
    }

    fn decide_inner(&self, request_id: &str) -> DepthDecision {
        if self.d_cap == 0 {
            return DepthDecision::fixed(0, DecisionReason::CapExhausted);
        }

        let Some(alpha_hat) = self.acceptance_rate(request_id) else {
            return DepthDecision::fixed(self.d_cap, DecisionReason::ColdStart);
        };

        if alpha_hat <= self.config.cost_ratio {
            return DepthDecision::fixed(0, DecisionReason::Gated);
        }

        let (depth, speedup) = self.model.best_depth(alpha_hat, self.d_cap);
        DepthDecision {
            depth,
            reason: DecisionReason::Optimized,
            speedup,
        }
    }

    /// Smoothed acceptance rate of a request, if known.
    pub fn acceptance_rate(&self, request_id: &str) -> Option<f64> {
        self.requests.peek(request_id).and_then(RequestStats::alpha_hat)
    }

    /// Accumulated statistics of a request.
    pub fn request_stats(&self, request_id: &str) -> Option<&RequestStats> {
        self.requests.peek(request_id)
    }

    /// Drop the state of a finished request.
    pub fn remove_request(&mut self, request_id: &str) -> Option<RequestStats> {
        let removed = self.requests.pop(request_id);
        if removed.is_some() {
            debug!(request_id, "request state removed");
        }
        removed
    }

    /// Drop all per-request state.
    pub fn clear(&mut self) {
        self.requests.clear();
    }

    /// Number of requests with tracked state.
    pub fn num_tracked_requests(&self) -> usize {
        self.requests.len()
    }

    /// Effective depth cap, `min(max_depth, ops_cap)`.
    pub fn effective_depth_cap(&self) -> usize {
        self.d_cap
    }

    /// The speedup model in use.
    pub fn model(&self) -> &SpeedupModel {
        &self.model
    }

    /// The (sanitized) configuration in use.
    pub fn config(&self) -> &DepthConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_exhausted_reason() {
        let controller = DepthController::new(DepthConfig::new(0));
        let decision = controller.decide("r");
        assert_eq!(decision.depth, 0);
        assert_eq!(decision.reason, DecisionReason::CapExhausted);
    }

    #[test]
    fn test_gated_reason() {
        let mut controller = DepthController::new(DepthConfig::new(4));
        controller.record_outcome("r", 10, 1);
        let decision = controller.decide("r");
        assert_eq!(decision, DepthDecision::fixed(0, DecisionReason::Gated));
    }

    #[test]
    fn test_empty_step_does_not_track() {
        let mut controller = DepthController::new(DepthConfig::new(4));
        controller.record_outcome("r", 0, 0);
        assert_eq!(controller.num_tracked_requests(), 0);
    }
}

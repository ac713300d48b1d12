//! Configuration types for spec-depth.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Default draft/verify cost ratio.
pub const DEFAULT_COST_RATIO: f64 = 0.3;

/// Default EMA weight for the acceptance-rate estimator.
pub const DEFAULT_EMA_WEIGHT: f64 = 0.6;

/// Configuration for the depth controller.
///
/// The verify latency is modeled as `t(d) ≈ A + B·d` with `A = 1 - γ` and
/// `B = c + γ`, normalized so that `t(0) = 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Hard ceiling on speculative depth imposed by the drafter.
    pub max_depth: usize,

    /// Draft/verify cost ratio (c).
    /// Also the no-regret gating threshold on the acceptance rate.
    pub cost_ratio: f64,

    /// Linear growth rate of verify latency with depth (γ).
    pub verify_growth: f64,

    /// Upper bound on the arithmetic-ops inflation factor.
    /// `None` means unbounded; values `<= 1` disable speculation.
    pub ops_budget: Option<f64>,

    /// Estimated per-position drafting overhead (ĉ).
    /// Only used to translate `ops_budget` into a depth cap.
    pub overhead_factor: f64,

    /// Smoothing factor for the acceptance-rate EMA (β).
    /// Larger values weigh history more.
    pub ema_weight: f64,

    /// Maximum number of requests with tracked state.
    /// When set, the least recently updated request is evicted first.
    pub max_tracked_requests: Option<usize>,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            cost_ratio: DEFAULT_COST_RATIO,
            verify_growth: 0.0,
            ops_budget: None,
            overhead_factor: 0.0,
            ema_weight: DEFAULT_EMA_WEIGHT,
            max_tracked_requests: None,
        }
    }
}

impl DepthConfig {
    /// Create a new config with the given depth ceiling.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Default::default()
        }
    }

    /// Set the draft/verify cost ratio.
    pub fn cost_ratio(mut self, c: f64) -> Self {
        self.cost_ratio = c;
        self
    }

    /// Set the verify latency growth rate.
    pub fn verify_growth(mut self, gamma: f64) -> Self {
        self.verify_growth = gamma;
        self
    }

    /// Set the arithmetic-ops budget.
    pub fn ops_budget(mut self, budget: f64) -> Self {
        self.ops_budget = Some(budget);
        self
    }

    /// Set the per-position drafting overhead.
    pub fn overhead_factor(mut self, overhead: f64) -> Self {
        self.overhead_factor = overhead;
        self
    }

    /// Set the EMA weight.
    pub fn ema_weight(mut self, beta: f64) -> Self {
        self.ema_weight = beta;
        self
    }

    /// Bound the number of tracked requests.
    pub fn max_tracked_requests(mut self, capacity: usize) -> Self {
        self.max_tracked_requests = Some(capacity);
        self
    }

    /// Coefficients `(A, B)` of the linearized verify latency model.
    pub fn linear_coefficients(&self) -> (f64, f64) {
        (
            1.0 - self.verify_growth,
            self.cost_ratio + self.verify_growth,
        )
    }

    /// Check that every option lies in its semantic domain.
    pub fn validate(&self) -> Result<()> {
        let reals = [
            ("cost_ratio", self.cost_ratio),
            ("verify_growth", self.verify_growth),
            ("overhead_factor", self.overhead_factor),
            ("ema_weight", self.ema_weight),
        ];
        for (name, value) in reals {
            if !value.is_finite() {
                return Err(Error::Config(format!("{name} must be finite, got {value}")));
            }
        }
        if let Some(budget) = self.ops_budget {
            if !budget.is_finite() {
                return Err(Error::Config(format!(
                    "ops_budget must be finite, got {budget}"
                )));
            }
        }
        if self.cost_ratio <= 0.0 {
            return Err(Error::Config(format!(
                "cost_ratio must be positive, got {}",
                self.cost_ratio
            )));
        }
        if self.verify_growth < 0.0 {
            return Err(Error::Config(format!(
                "verify_growth must be non-negative, got {}",
                self.verify_growth
            )));
        }
        if self.overhead_factor < 0.0 {
            return Err(Error::Config(format!(
                "overhead_factor must be non-negative, got {}",
                self.overhead_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.ema_weight) {
            return Err(Error::Config(format!(
                "ema_weight must lie in [0, 1], got {}",
                self.ema_weight
            )));
        }
        if self.max_tracked_requests == Some(0) {
            return Err(Error::Config(
                "max_tracked_requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Coerce out-of-domain values into something the controller can use.
    ///
    /// Unlike [`validate`](Self::validate) this never fails.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !self.cost_ratio.is_finite() {
            warn!(value = self.cost_ratio, "non-finite cost_ratio, using default");
            self.cost_ratio = defaults.cost_ratio;
        }
        if !self.verify_growth.is_finite() {
            warn!(value = self.verify_growth, "non-finite verify_growth, using default");
            self.verify_growth = defaults.verify_growth;
        }
        if !self.overhead_factor.is_finite() || self.overhead_factor < 0.0 {
            warn!(value = self.overhead_factor, "invalid overhead_factor, using 0");
            self.overhead_factor = 0.0;
        }
        if self.ema_weight.is_nan() {
            warn!("NaN ema_weight, using default");
            self.ema_weight = defaults.ema_weight;
        } else if !(0.0..=1.0).contains(&self.ema_weight) {
            warn!(value = self.ema_weight, "ema_weight outside [0, 1], clamping");
            self.ema_weight = self.ema_weight.clamp(0.0, 1.0);
        }
        if matches!(self.ops_budget, Some(b) if b.is_nan()) {
            warn!("NaN ops_budget, treating as absent");
            self.ops_budget = None;
        }
        if self.max_tracked_requests == Some(0) {
            warn!("max_tracked_requests of 0, tracking unbounded");
            self.max_tracked_requests = None;
        }
        self
    }
}

//! Closed-form speedup model for speculative decoding.
//!
//! With per-token acceptance probability α, speculating `d` tokens yields an
//! expected `(1 - α^(d+1)) / (1 - α)` tokens per verify step. Dividing by the
//! linearized verify latency `A + B·d` gives the speedup over plain decoding:
//!
//! ```text
//! S(d, α) = (1 - α^(d+1)) / ((1 - α) · (A + B·d))
//! ```
//!
//! At α = 1 the formula has a removable singularity; its limit is
//! `(d + 1) / (A + B·d)`.

/// Speedup returned whenever the model cannot claim a benefit.
pub const NO_SPEEDUP: f64 = 1.0;

/// Linearized speedup model `S(d, α)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedupModel {
    /// Intercept of the verify latency model (`1 - γ`).
    a: f64,
    /// Slope of the verify latency model (`c + γ`).
    b: f64,
}

impl SpeedupModel {
    /// Create a model from the latency coefficients `A` and `B`.
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Create a model from the cost ratio `c` and verify growth `γ`.
    pub fn from_costs(cost_ratio: f64, verify_growth: f64) -> Self {
        Self::new(1.0 - verify_growth, cost_ratio + verify_growth)
    }

    /// Intercept `A`.
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Slope `B`.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Normalized verify latency `A + B·d`.
    pub fn verify_latency(&self, depth: usize) -> f64 {
        self.a + self.b * depth as f64
    }

    /// Expected speedup of speculating `depth` tokens at acceptance `alpha`.
    ///
    /// Degenerate latency (`A + B·d <= 0`) yields [`NO_SPEEDUP`].
    pub fn speedup(&self, depth: usize, alpha: f64) -> f64 {
        let latency = self.verify_latency(depth);
        let d = depth as f64;

        if alpha >= 1.0 {
            if latency <= 0.0 {
                return NO_SPEEDUP;
            }
            return (d + 1.0) / latency;
        }

        let denom = (1.0 - alpha) * latency;
        if denom <= 0.0 || !denom.is_finite() {
            return NO_SPEEDUP;
        }
        let s = (1.0 - alpha.powi(depth_exponent(depth))) / denom;
        if s.is_finite() {
            s
        } else {
            NO_SPEEDUP
        }
    }

    /// Speedup for every depth in `0..=d_cap`.
    pub fn speedup_curve(&self, alpha: f64, d_cap: usize) -> Vec<f64> {
        (0..=d_cap).map(|d| self.speedup(d, alpha)).collect()
    }

    /// Depth in `0..=d_cap` with the largest speedup, and that speedup.
    ///
    /// The scan starts from `(0, NO_SPEEDUP)` and only moves on a strictly
    /// greater value, so ties resolve to the smaller depth and a depth is
    /// only picked when it beats plain decoding. The reported speedup is never
    /// below `S(0, α)`, which exceeds 1 when verify latency grows with depth.
    pub fn best_depth(&self, alpha: f64, d_cap: usize) -> (usize, f64) {
        if alpha <= 0.0 {
            return (0, self.speedup(0, alpha).max(NO_SPEEDUP));
        }

        let mut best = (0, NO_SPEEDUP);
        for d in 0..=d_cap {
            let s = self.speedup(d, alpha);
            if s > best.1 {
                best = (d, s);
            }
        }
        best
    }
}

/// Exponent `d + 1` as an `i32`, saturating for absurd depths.
fn depth_exponent(depth: usize) -> i32 {
    i32::try_from(depth).map_or(i32::MAX, |d| d.saturating_add(1))
}

/// Depth cap implied by an arithmetic-ops budget.
///
/// Drafting `d` positions inflates arithmetic ops by at most
/// `1 + d·(1 + ĉ)`, so the budget admits `d <= floor((B_ops - 1) / (1 + ĉ))`.
/// The quotient is the rounded float division, so exact multiples such as
/// `(7.5 - 1) / 1.3` land on the integer (5) rather than just below it.
/// Returns `None` when no budget is configured.
pub fn ops_depth_cap(ops_budget: Option<f64>, overhead_factor: f64) -> Option<usize> {
    let budget = ops_budget?;
    if budget <= 1.0 {
        return Some(0);
    }
    let per_position = 1.0 + overhead_factor.max(0.0);
    let cap = ((budget - 1.0) / per_position).floor();
    // Float-to-int casts saturate; NaN maps to 0.
    Some(cap.max(0.0) as usize)
}

//! Per-request acceptance statistics.

/// Acceptance history of a single request.
///
/// `alpha_hat` is an exponential moving average of the per-step acceptance
/// fraction. It stays `None` until a step with at least one drafted token
/// has been recorded, and always lies in `[0, 1]` afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestStats {
    /// Smoothed acceptance probability.
    alpha_hat: Option<f64>,
    /// Total drafted tokens across recorded steps.
    drafted: u64,
    /// Total accepted tokens across recorded steps.
    accepted: u64,
    /// Number of recorded steps with `drafted > 0`.
    num_steps: u64,
}

impl RequestStats {
    /// Create empty stats (cold start).
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one speculative step into the estimate.
    ///
    /// Steps with nothing drafted carry no information and are ignored.
    /// Returns `true` if the estimate changed.
    pub fn observe(&mut self, drafted: u64, accepted: u64, ema_weight: f64) -> bool {
        if drafted == 0 {
            return false;
        }

        let alpha = (accepted as f64 / drafted as f64).clamp(0.0, 1.0);
        let next = match self.alpha_hat {
            None => alpha,
            Some(prev) => ema_weight * prev + (1.0 - ema_weight) * alpha,
        };
        self.alpha_hat = Some(next.clamp(0.0, 1.0));

        self.drafted = self.drafted.saturating_add(drafted);
        self.accepted = self.accepted.saturating_add(accepted);
        self.num_steps += 1;
        true
    }

    /// Smoothed acceptance probability, if any feedback was recorded.
    pub fn alpha_hat(&self) -> Option<f64> {
        self.alpha_hat
    }

    /// Total drafted tokens.
    pub fn drafted(&self) -> u64 {
        self.drafted
    }

    /// Total accepted tokens.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Number of recorded steps.
    pub fn num_steps(&self) -> u64 {
        self.num_steps
    }

    /// Unsmoothed lifetime acceptance fraction.
    pub fn lifetime_acceptance(&self) -> Option<f64> {
        if self.drafted == 0 {
            return None;
        }
        Some((self.accepted as f64 / self.drafted as f64).clamp(0.0, 1.0))
    }
}

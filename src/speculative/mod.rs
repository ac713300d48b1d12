//! Adaptive depth control for speculative decoding.
//!
//! Speculative decoding drafts `d` tokens cheaply and verifies them with the
//! target model in one pass. Drafting more tokens pays off only while the
//! target keeps accepting them, so the best depth depends on the request.
//!
//! ## How it works
//!
//! 1. **Feedback**: After each verify step the serving loop reports how many
//!    tokens were drafted and how many were accepted. The controller keeps
//!    an exponential moving average of the acceptance fraction per request.
//!
//! 2. **Gating**: If the estimated acceptance rate does not exceed the
//!    draft/verify cost ratio, speculation cannot beat plain decoding and the
//!    depth is 0.
//!
//! 3. **Search**: Otherwise the depth maximizing the closed-form speedup
//!    `S(d, α)` within the depth cap is chosen.
//!
//! ## Example
//!
//! ```text
//! c = 0.3, γ = 0, α̂ = 0.9, max_depth = 4
//! S(d):  d=0 1.00 | d=1 1.46 | d=2 1.69 | d=3 1.81 | d=4 1.86
//! Decision: depth 4
//! ```

pub mod controller;
pub mod speedup;
pub mod stats;

pub use controller::{DecisionReason, DepthController, DepthDecision};
pub use speedup::{ops_depth_cap, SpeedupModel, NO_SPEEDUP};
pub use stats::RequestStats;

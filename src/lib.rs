//! spec-depth: adaptive depth selection for speculative decoding.
//!
//! This crate decides, per request and per decoding step, how many tokens
//! the drafter should speculate ahead of verification:
//! - Online acceptance-rate estimation per request
//! - No-regret gating against the draft/verify cost ratio
//! - Closed-form speedup maximization under depth and ops-budget caps

pub mod config;
pub mod error;

pub mod speculative;

pub use config::DepthConfig;
pub use error::{Error, Result};
pub use speculative::{
    ops_depth_cap, DecisionReason, DepthController, DepthDecision, RequestStats, SpeedupModel,
};

//! Confidence gate
//!
//! Decides whether a classifier prediction is trusted enough to run the
//! policy resolver. Below the threshold the pipeline abstains.

use crate::{Error, Result};
use serde::Serialize;

/// Threshold used when configuration does not set one
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Action reported for abstentions
pub const ABSTAIN_ACTION: &str = "Unsure";

/// Rationale reported for abstentions
pub const ABSTAIN_RATIONALE: &str = "Low confidence prediction. Try another angle or better light.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateDecision {
    Proceed,
    Abstain,
}

/// Fixed-threshold gate. Stateless; copy freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    threshold: f64,
}

impl ConfidenceGate {
    /// Create a gate; the threshold must lie in [0, 1]
    pub fn new(threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `Abstain` when `confidence < threshold`, otherwise `Proceed`.
    ///
    /// `confidence` is expected to be a probability; see [`check_confidence`].
    pub fn check(&self, confidence: f64) -> GateDecision {
        if confidence < self.threshold {
            GateDecision::Abstain
        } else {
            GateDecision::Proceed
        }
    }
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Reject values that are not probabilities
pub fn check_confidence(confidence: f64) -> Result<f64> {
    if confidence.is_finite() && (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(Error::InvalidInput(format!(
            "confidence must be within [0, 1], got {}",
            confidence
        )))
    }
}

//! # Recyclo Common Library
//!
//! Shared code for the Recyclo disposal advisor including:
//! - Disposal policy tables and the policy resolver
//! - Confidence gating and the decision pipeline
//! - Outcome normalization and per-user progress summaries
//! - Classifier boundary types (label set, predictions, image payloads)
//! - Configuration loading
//! - SQLite decision log storage

pub mod attrs;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod locale;
pub mod outcome;
pub mod pipeline;
pub mod policy;
pub mod rules;
pub mod summary;
pub mod time;
pub mod tips;

pub use attrs::{Attribute, ItemAttributes};
pub use error::{Error, Result};
pub use gate::{ConfidenceGate, GateDecision};
pub use locale::Locale;
pub use outcome::{CategoryCounts, NormalizedCategory};
pub use pipeline::{Decision, DecisionEngine};
pub use rules::{MaterialRule, RuleTable};

//! Rotating disposal tips
//!
//! Hints are keyed by material ("Plastic") or action ("Drop-off"); one is
//! picked at random per response. Lookup never fails.

use crate::rules::lookup_key;
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Returned when neither the material nor the action has tips
pub const GENERIC_TIP: &str = "Check local recycling guidelines for your area.";

/// Upper bound on tips per key
pub const MAX_TIPS_PER_KEY: usize = 3;

/// Validated tip lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TipBook {
    entries: BTreeMap<String, Vec<String>>,
}

impl TipBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate raw tip lists: at most [`MAX_TIPS_PER_KEY`] non-blank entries
    pub fn from_raw(raw: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (key, tips) in raw {
            if tips.len() > MAX_TIPS_PER_KEY {
                return Err(Error::Config(format!(
                    "tips.{}: {} entries, at most {} allowed",
                    key,
                    tips.len(),
                    MAX_TIPS_PER_KEY
                )));
            }
            if tips.iter().any(|t| t.trim().is_empty()) {
                return Err(Error::Config(format!("tips.{}: blank entry", key)));
            }
            entries.insert(key.trim().to_string(), tips.clone());
        }
        Ok(Self { entries })
    }

    pub fn with_tips(mut self, key: impl Into<String>, tips: &[&str]) -> Self {
        self.entries
            .insert(key.into(), tips.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Candidate list: material first, then action; empty lists are skipped
    pub fn candidates(&self, material: &str, action: &str) -> &[String] {
        [material, action]
            .into_iter()
            .filter_map(|key| lookup_key(&self.entries, key))
            .map(|(_, tips)| tips.as_slice())
            .find(|tips| !tips.is_empty())
            .unwrap_or(&[])
    }

    /// Pick a tip with the caller's RNG
    pub fn pick_with<R: Rng + ?Sized>(&self, material: &str, action: &str, rng: &mut R) -> &str {
        self.candidates(material, action)
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(GENERIC_TIP)
    }

    /// Pick a tip with the thread-local RNG
    pub fn pick(&self, material: &str, action: &str) -> &str {
        self.pick_with(material, action, &mut rand::thread_rng())
    }
}

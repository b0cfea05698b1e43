//! Outcome normalization
//!
//! Collapses free-form action strings ("Recyclable", "curbside trash",
//! "Drop-off") into the closed reporting taxonomy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reporting category for a logged decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NormalizedCategory {
    Recyclable,
    Compost,
    Landfill,
    Unsure,
    Other,
}

impl NormalizedCategory {
    pub const ALL: [NormalizedCategory; 5] = [
        NormalizedCategory::Recyclable,
        NormalizedCategory::Compost,
        NormalizedCategory::Landfill,
        NormalizedCategory::Unsure,
        NormalizedCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NormalizedCategory::Recyclable => "Recyclable",
            NormalizedCategory::Compost => "Compost",
            NormalizedCategory::Landfill => "Landfill",
            NormalizedCategory::Unsure => "Unsure",
            NormalizedCategory::Other => "Other",
        }
    }

    /// Inverse of [`as_str`](Self::as_str); exact match only
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for NormalizedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table, checked in order; first hit wins
const KEYWORDS: [(NormalizedCategory, &[&str]); 4] = [
    (NormalizedCategory::Recyclable, &["recycl"]),
    (NormalizedCategory::Compost, &["compost", "organic"]),
    (NormalizedCategory::Landfill, &["landfill", "trash", "garbage"]),
    (NormalizedCategory::Unsure, &["unsure", "not sure", "abstain"]),
];

/// Map an action or label string to its reporting category
///
/// ```
/// use recyclo_common::outcome::normalize;
/// use recyclo_common::NormalizedCategory;
///
/// assert_eq!(normalize("RECYCLE NOW"), NormalizedCategory::Recyclable);
/// assert_eq!(normalize("Drop-off"), NormalizedCategory::Other);
/// ```
pub fn normalize(raw: &str) -> NormalizedCategory {
    let lowered = raw.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(NormalizedCategory::Other)
}

/// Count per category; always holds every category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryCounts(BTreeMap<NormalizedCategory, u64>);

impl CategoryCounts {
    /// All categories at zero
    pub fn zeroed() -> Self {
        Self(NormalizedCategory::ALL.iter().map(|c| (*c, 0)).collect())
    }

    pub fn add(&mut self, category: NormalizedCategory, count: u64) {
        *self.0.entry(category).or_insert(0) += count;
    }

    pub fn get(&self, category: NormalizedCategory) -> u64 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub fn sum(&self) -> u64 {
        self.0.values().sum()
    }
}

impl Default for CategoryCounts {
    fn default() -> Self {
        Self::zeroed()
    }
}

//! Item attributes
//!
//! Client-supplied attribute bags (`{"greasy_or_wet": "yes", "foam": 1}`) are
//! normalized into boolean flags before they reach the policy resolver.
//! Only [`Attribute`] values take part in override matching; anything else is
//! kept for logging but can never select a rule.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Attribute names recognized by the policy resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    /// Plastic bags and film that scrunch in the hand
    SoftBag,
    /// Expanded polystyrene
    Foam,
    /// Lined paper cups and drink cartons
    PaperCupOrCarton,
    PaperCup,
    Carton,
    /// Oily or soaked paper and cardboard
    GreasyOrWet,
    Hazard,
}

impl Attribute {
    /// Override priority: the first asserted attribute in this order wins
    pub const PRIORITY: [Attribute; 7] = [
        Attribute::SoftBag,
        Attribute::Foam,
        Attribute::PaperCupOrCarton,
        Attribute::PaperCup,
        Attribute::Carton,
        Attribute::GreasyOrWet,
        Attribute::Hazard,
    ];

    /// Key used in rule files and request payloads
    pub fn key(self) -> &'static str {
        match self {
            Attribute::SoftBag => "soft_bag",
            Attribute::Foam => "foam",
            Attribute::PaperCupOrCarton => "paper_cup_or_carton",
            Attribute::PaperCup => "paper_cup",
            Attribute::Carton => "carton",
            Attribute::GreasyOrWet => "greasy_or_wet",
            Attribute::Hazard => "hazard",
        }
    }

    /// Human-readable label used in rationales
    pub fn label(self) -> &'static str {
        match self {
            Attribute::SoftBag => "Soft bag / plastic wrap",
            Attribute::Foam => "Foam / Styrofoam",
            Attribute::PaperCupOrCarton => "Paper cup or carton",
            Attribute::PaperCup => "Paper cup",
            Attribute::Carton => "Carton",
            Attribute::GreasyOrWet => "Greasy or wet",
            Attribute::Hazard => "Hazardous item",
        }
    }

    /// Look up an attribute by key (trimmed, case-insensitive)
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::PRIORITY.into_iter().find(|a| a.key() == key)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Normalize an arbitrary JSON value to a flag.
///
/// Only explicit falsy values turn a flag off: `false`, `null`, zero, and the
/// strings `0/false/no/n/off` or blank. Every other value counts as asserted.
pub fn normalize_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            match s.as_str() {
                "1" | "true" | "yes" | "y" | "on" => true,
                "0" | "false" | "no" | "n" | "off" | "" => false,
                _ => true,
            }
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Normalized attribute flags for one item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemAttributes {
    asserted: BTreeSet<Attribute>,
    unrecognized: BTreeMap<String, bool>,
}

impl ItemAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON payload. Non-object values yield an empty set.
    pub fn from_json(value: Option<&Value>) -> Self {
        let mut attrs = Self::new();
        if let Some(Value::Object(map)) = value {
            for (key, raw) in map {
                attrs.set(key, normalize_flag(raw));
            }
        }
        attrs
    }

    /// Record a flag by key. Later values for the same key replace earlier ones.
    pub fn set(&mut self, key: &str, flag: bool) {
        match Attribute::from_key(key) {
            Some(attr) => {
                if flag {
                    self.asserted.insert(attr);
                } else {
                    self.asserted.remove(&attr);
                }
            }
            None => {
                self.unrecognized.insert(key.to_string(), flag);
            }
        }
    }

    /// Builder form of [`ItemAttributes::set`] for a recognized attribute
    pub fn with(mut self, attr: Attribute) -> Self {
        self.asserted.insert(attr);
        self
    }

    pub fn is_asserted(&self, attr: Attribute) -> bool {
        self.asserted.contains(&attr)
    }

    /// Asserted recognized attributes in priority order
    pub fn asserted_in_priority(&self) -> impl Iterator<Item = Attribute> + '_ {
        Attribute::PRIORITY
            .into_iter()
            .filter(move |a| self.asserted.contains(a))
    }

    /// Keys that did not match any recognized attribute
    pub fn unrecognized(&self) -> &BTreeMap<String, bool> {
        &self.unrecognized
    }

    pub fn is_empty(&self) -> bool {
        self.asserted.is_empty() && self.unrecognized.is_empty()
    }
}

//! Disposal rule tables
//!
//! Two-level table `locale -> material -> rule`. Each [`MaterialRule`] has a
//! required default action and optional per-attribute overrides. Tables are
//! validated once when built and are read-only afterwards.

use crate::attrs::Attribute;
use crate::locale::{title_case, Locale, DEFAULT_LOCALE};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Key holding a material's fallback action
pub const DEFAULT_KEY: &str = "default";

/// Material used when a label is not listed for a locale
pub const TRASH_MATERIAL: &str = "Trash";

/// Raw nested form as it appears in rule files:
/// `locale -> material -> (attribute | "default") -> action`
pub type RawRuleTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

/// Disposal rule for one material in one locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRule {
    default_action: String,
    overrides: BTreeMap<Attribute, String>,
}

impl MaterialRule {
    pub fn new(default_action: impl Into<String>) -> Self {
        Self {
            default_action: default_action.into(),
            overrides: BTreeMap::new(),
        }
    }

    /// Add an attribute override
    pub fn with_override(mut self, attr: Attribute, action: impl Into<String>) -> Self {
        self.overrides.insert(attr, action.into());
        self
    }

    pub fn default_action(&self) -> &str {
        &self.default_action
    }

    /// Override action for `attr`, if the rule defines one
    pub fn override_for(&self, attr: Attribute) -> Option<&str> {
        self.overrides.get(&attr).map(String::as_str)
    }

    fn from_raw(locale: &str, material: &str, raw: &BTreeMap<String, String>) -> Result<Self> {
        let default_action = raw
            .get(DEFAULT_KEY)
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "rules.{}.{}: missing '{}' action",
                    locale, material, DEFAULT_KEY
                ))
            })?;

        let mut rule = MaterialRule::new(default_action.trim());
        for (key, action) in raw {
            if key == DEFAULT_KEY {
                continue;
            }
            let attr = Attribute::from_key(key).ok_or_else(|| {
                Error::Config(format!(
                    "rules.{}.{}: unknown attribute '{}'",
                    locale, material, key
                ))
            })?;
            if action.trim().is_empty() {
                return Err(Error::Config(format!(
                    "rules.{}.{}.{}: empty action",
                    locale, material, key
                )));
            }
            rule.overrides.insert(attr, action.trim().to_string());
        }
        Ok(rule)
    }
}

/// Material rules for one locale
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleRules {
    materials: BTreeMap<String, MaterialRule>,
}

impl LocaleRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_material(mut self, name: impl Into<String>, rule: MaterialRule) -> Self {
        self.materials.insert(name.into(), rule);
        self
    }

    /// Find a material with the case-insensitive matching of [`lookup_key`]
    pub fn find(&self, material: &str) -> Option<(&str, &MaterialRule)> {
        lookup_key(&self.materials, material)
    }

    /// Exact lookup of the locale's catch-all entry
    pub fn trash(&self) -> Option<(&str, &MaterialRule)> {
        self.materials
            .get_key_value(TRASH_MATERIAL)
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Complete rule table: the mandatory default locale plus per-city tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    default: LocaleRules,
    cities: BTreeMap<String, LocaleRules>,
}

impl RuleTable {
    /// Table with only default rules
    pub fn new(default: LocaleRules) -> Self {
        Self {
            default,
            cities: BTreeMap::new(),
        }
    }

    /// Add a city table. The key is normalized like user input.
    pub fn with_city(mut self, city: &str, rules: LocaleRules) -> Self {
        let locale = Locale::normalize(Some(city));
        if locale.is_default() {
            self.default = rules;
        } else {
            self.cities.insert(locale.key().to_string(), rules);
        }
        self
    }

    /// Validate and build from the raw nested form
    pub fn from_raw(raw: &RawRuleTable) -> Result<Self> {
        let mut default = None;
        let mut cities = BTreeMap::new();

        for (raw_locale, materials) in raw {
            let locale = Locale::normalize(Some(raw_locale));
            let mut rules = LocaleRules::new();
            for (material, raw_rule) in materials {
                let rule = MaterialRule::from_raw(locale.key(), material, raw_rule)?;
                rules.materials.insert(material.trim().to_string(), rule);
            }

            let duplicate = if locale.is_default() {
                default.replace(rules).is_some()
            } else {
                cities.insert(locale.key().to_string(), rules).is_some()
            };
            if duplicate {
                return Err(Error::Config(format!(
                    "rules: locale '{}' defined more than once",
                    locale
                )));
            }
        }

        let default = default.ok_or_else(|| {
            Error::Config(format!("rules: missing '{}' locale", DEFAULT_LOCALE))
        })?;

        Ok(Self { default, cities })
    }

    /// Rules for the default locale
    pub fn default_rules(&self) -> &LocaleRules {
        &self.default
    }

    /// Rules for `locale`, falling back to the default locale
    pub fn rules_for(&self, locale: &Locale) -> &LocaleRules {
        self.cities.get(locale.key()).unwrap_or(&self.default)
    }

    /// Whether a city-specific table exists
    pub fn has_city(&self, locale: &Locale) -> bool {
        self.cities.contains_key(locale.key())
    }

    /// City keys with their own table
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.cities.keys().map(String::as_str)
    }
}

/// Case-insensitive key lookup shared by rule and tip tables.
///
/// Tries, in order: the trimmed input as given, its title-cased form, then a
/// scan comparing lower-cased keys. Blank input never matches.
pub fn lookup_key<'a, V>(map: &'a BTreeMap<String, V>, wanted: &str) -> Option<(&'a str, &'a V)> {
    let wanted = wanted.trim();
    if wanted.is_empty() {
        return None;
    }

    if let Some((k, v)) = map.get_key_value(wanted) {
        return Some((k.as_str(), v));
    }

    if let Some((k, v)) = map.get_key_value(&title_case(wanted)) {
        return Some((k.as_str(), v));
    }

    let lowered = wanted.to_lowercase();
    map.iter()
        .find(|(k, _)| k.to_lowercase() == lowered)
        .map(|(k, v)| (k.as_str(), v))
}

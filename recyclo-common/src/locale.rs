//! Locale keys
//!
//! A locale is the city a user declared, reduced to the key used by the rule
//! tables: "Austin, TX", " austin" and "AUSTIN" all become `austin`.

use serde::Serialize;
use std::fmt;

/// Sentinel locale used when no city is given or the city has no table
pub const DEFAULT_LOCALE: &str = "default";

/// Normalized city key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Normalize raw user input: trim, lower-case, cut at the first comma.
    ///
    /// ```
    /// use recyclo_common::Locale;
    ///
    /// assert_eq!(Locale::normalize(Some("Austin, TX")).key(), "austin");
    /// assert_eq!(Locale::normalize(Some("  ")).key(), "default");
    /// assert_eq!(Locale::normalize(None).key(), "default");
    /// ```
    pub fn normalize(raw: Option<&str>) -> Self {
        let lowered = raw.unwrap_or_default().trim().to_lowercase();
        let city = lowered.split(',').next().unwrap_or_default().trim();
        if city.is_empty() {
            Self::default()
        } else {
            Self(city.to_string())
        }
    }

    pub fn key(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_LOCALE
    }

    /// Display form used in rationales ("san francisco" -> "San Francisco")
    pub fn display_name(&self) -> String {
        if self.is_default() {
            "Default".to_string()
        } else {
            title_case(&self.0)
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self(DEFAULT_LOCALE.to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capitalize each whitespace-separated word and lower-case the rest
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_state_suffix() {
        assert_eq!(Locale::normalize(Some("Austin, TX")).key(), "austin");
        assert_eq!(Locale::normalize(Some("  New York ,NY")).key(), "new york");
        assert_eq!(Locale::normalize(Some("Washington, DC, USA")).key(), "washington");
    }

    #[test]
    fn test_normalize_empty_inputs() {
        assert!(Locale::normalize(None).is_default());
        assert!(Locale::normalize(Some("")).is_default());
        assert!(Locale::normalize(Some(" , TX")).is_default());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Locale::normalize(Some("san francisco")).display_name(), "San Francisco");
        assert_eq!(Locale::default().display_name(), "Default");
        assert_eq!(Locale::normalize(Some("DEFAULT")).display_name(), "Default");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("plastic bottle"), "Plastic Bottle");
        assert_eq!(title_case("pLASTIC"), "Plastic");
        assert_eq!(title_case("  los   angeles "), "Los Angeles");
        assert_eq!(title_case(""), "");
    }
}

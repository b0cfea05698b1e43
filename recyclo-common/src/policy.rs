//! Disposal policy resolution
//!
//! Resolution is total: every material string produces an action. The lookup
//! chain is
//!
//! 1. the locale's table (or the default table for unknown locales)
//! 2. that table's `Trash` entry
//! 3. the default table, same matching
//! 4. the default table's `Trash` entry
//! 5. a built-in `Landfill` rule
//!
//! Once a rule is chosen, the first asserted attribute in
//! [`Attribute::PRIORITY`] that the rule overrides decides the action;
//! otherwise the rule's default applies.

use crate::attrs::{Attribute, ItemAttributes};
use crate::locale::Locale;
use crate::rules::{LocaleRules, MaterialRule, RuleTable};
use serde::Serialize;

/// Action used when no table has a matching material or a `Trash` entry
pub const EMERGENCY_ACTION: &str = "Landfill";

/// Material name reported when a blank material falls through every table
pub const UNKNOWN_MATERIAL: &str = "Unknown";

/// Outcome of a policy lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Material name as found in the rule table
    pub material: String,
    /// Disposal action from the rule table
    pub action: String,
    /// One-line explanation shown to the user
    pub rationale: String,
    /// Attribute whose override produced the action
    #[serde(skip)]
    pub attribute: Option<Attribute>,
    /// Normalized locale used for the lookup
    pub locale: Locale,
}

enum Selected<'a> {
    Rule { material: &'a str, rule: &'a MaterialRule },
    Emergency,
}

/// Resolve the disposal action for `material` in `locale_raw`
pub fn resolve(
    table: &RuleTable,
    material: &str,
    attrs: &ItemAttributes,
    locale_raw: Option<&str>,
) -> Resolution {
    let locale = Locale::normalize(locale_raw);
    let selected = select_rule(table, &locale, material);

    let (material_name, action, attribute) = match selected {
        Selected::Rule { material, rule } => {
            let hit = attrs
                .asserted_in_priority()
                .find_map(|attr| rule.override_for(attr).map(|action| (attr, action)));
            match hit {
                Some((attr, action)) => (material.to_string(), action.to_string(), Some(attr)),
                None => (material.to_string(), rule.default_action().to_string(), None),
            }
        }
        Selected::Emergency => {
            let name = match material.trim() {
                "" => UNKNOWN_MATERIAL.to_string(),
                name => name.to_string(),
            };
            (name, EMERGENCY_ACTION.to_string(), None)
        }
    };

    let rationale = match attribute {
        Some(attr) => format!(
            "{} marked as '{}' → {} ({})",
            material_name,
            attr.label(),
            action,
            locale.display_name()
        ),
        None => format!("{} → {} ({})", material_name, action, locale.display_name()),
    };

    Resolution {
        material: material_name,
        action,
        rationale,
        attribute,
        locale,
    }
}

fn select_rule<'a>(table: &'a RuleTable, locale: &Locale, material: &str) -> Selected<'a> {
    let local = table.rules_for(locale);
    if let Some(selected) = find_or_trash(local, material) {
        return selected;
    }

    find_or_trash(table.default_rules(), material).unwrap_or(Selected::Emergency)
}

fn find_or_trash<'a>(rules: &'a LocaleRules, material: &str) -> Option<Selected<'a>> {
    rules
        .find(material)
        .or_else(|| rules.trash())
        .map(|(material, rule)| Selected::Rule { material, rule })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuleTable {
        let default = LocaleRules::new()
            .with_material(
                "Plastic",
                MaterialRule::new("Recyclable")
                    .with_override(Attribute::SoftBag, "Drop-off")
                    .with_override(Attribute::Foam, "Landfill"),
            )
            .with_material(
                "Paper",
                MaterialRule::new("Recyclable").with_override(Attribute::GreasyOrWet, "Landfill"),
            )
            .with_material("Battery", MaterialRule::new("Drop-off"))
            .with_material("Trash", MaterialRule::new("Landfill"));

        let austin = LocaleRules::new()
            .with_material(
                "Paper",
                MaterialRule::new("Recyclable").with_override(Attribute::GreasyOrWet, "Compost"),
            )
            .with_material("Textiles", MaterialRule::new("Drop-off"));

        RuleTable::new(default).with_city("austin", austin)
    }

    #[test]
    fn test_city_override() {
        let attrs = ItemAttributes::new().with(Attribute::GreasyOrWet);
        let r = resolve(&table(), "Paper", &attrs, Some("Austin, TX"));
        assert_eq!(r.action, "Compost");
        assert_eq!(r.attribute, Some(Attribute::GreasyOrWet));
        assert_eq!(r.rationale, "Paper marked as 'Greasy or wet' → Compost (Austin)");
    }

    #[test]
    fn test_default_action_rationale() {
        let r = resolve(&table(), "plastic", &ItemAttributes::new(), None);
        assert_eq!(r.action, "Recyclable");
        assert_eq!(r.material, "Plastic");
        assert_eq!(r.rationale, "Plastic → Recyclable (Default)");
    }

    #[test]
    fn test_city_without_material_falls_back_to_default_table() {
        // austin has no Plastic and no Trash entry
        let r = resolve(&table(), "Plastic", &ItemAttributes::new(), Some("austin"));
        assert_eq!(r.action, "Recyclable");
        assert_eq!(r.rationale, "Plastic → Recyclable (Austin)");
    }

    #[test]
    fn test_unknown_material_uses_trash() {
        let r = resolve(&table(), "Styrofoam peanut", &ItemAttributes::new(), None);
        assert_eq!(r.material, "Trash");
        assert_eq!(r.action, "Landfill");
    }

    #[test]
    fn test_city_trash_preferred_over_default_table() {
        let austin = LocaleRules::new().with_material("Trash", MaterialRule::new("Landfill (city)"));
        let table = table().with_city("austin", austin);

        // Battery exists only in the default table; the city's Trash wins first
        let r = resolve(&table, "Battery", &ItemAttributes::new(), Some("austin"));
        assert_eq!(r.material, "Trash");
        assert_eq!(r.action, "Landfill (city)");
    }

    #[test]
    fn test_emergency_rule() {
        let table = RuleTable::new(
            LocaleRules::new().with_material("Glass", MaterialRule::new("Recyclable")),
        );
        let r = resolve(&table, "Mystery", &ItemAttributes::new().with(Attribute::Foam), None);
        assert_eq!(r.material, "Mystery");
        assert_eq!(r.action, EMERGENCY_ACTION);
        assert_eq!(r.rationale, "Mystery → Landfill (Default)");

        let blank = resolve(&table, "  ", &ItemAttributes::new(), None);
        assert_eq!(blank.material, UNKNOWN_MATERIAL);
    }

    #[test]
    fn test_priority_first_match() {
        let attrs = ItemAttributes::new()
            .with(Attribute::Foam)
            .with(Attribute::SoftBag);
        let r = resolve(&table(), "Plastic", &attrs, None);
        assert_eq!(r.action, "Drop-off");
        assert_eq!(r.attribute, Some(Attribute::SoftBag));
    }

    #[test]
    fn test_asserted_attribute_without_override_is_ignored() {
        let attrs = ItemAttributes::new().with(Attribute::Hazard).with(Attribute::Foam);
        let r = resolve(&table(), "Plastic", &attrs, None);
        assert_eq!(r.attribute, Some(Attribute::Foam));
        assert_eq!(r.action, "Landfill");
    }
}

//! Behavioral properties of the decision core, checked against the built-in
//! policy and small injected tables.

use recyclo_common::config::PolicyConfig;
use recyclo_common::gate::DEFAULT_CONFIDENCE_THRESHOLD;
use recyclo_common::outcome::normalize;
use recyclo_common::policy::resolve;
use recyclo_common::rules::LocaleRules;
use recyclo_common::summary::Summary;
use recyclo_common::{
    Attribute, ConfidenceGate, DecisionEngine, GateDecision, ItemAttributes, MaterialRule,
    NormalizedCategory, RuleTable,
};
use serde_json::json;

fn builtin() -> RuleTable {
    PolicyConfig::builtin().unwrap().rules
}

fn attrs(value: serde_json::Value) -> ItemAttributes {
    ItemAttributes::from_json(Some(&value))
}

#[test]
fn test_unknown_locale_matches_default_for_default_only_material() {
    let table = RuleTable::new(
        LocaleRules::new()
            .with_material("Battery", MaterialRule::new("Drop-off"))
            .with_material("Trash", MaterialRule::new("Landfill")),
    )
    .with_city("austin", LocaleRules::new().with_material("Paper", MaterialRule::new("Recyclable")));

    let none = ItemAttributes::new();
    let explicit = resolve(&table, "Battery", &none, Some("default"));
    let unknown = resolve(&table, "Battery", &none, Some("Atlantis"));
    let austin = resolve(&table, "Battery", &none, Some("austin"));

    assert_eq!(unknown.action, explicit.action);
    assert_eq!(austin.action, "Drop-off");
}

#[test]
fn test_unknown_locale_uses_default_table_for_builtin_rules() {
    let table = builtin();
    for material in ["Plastic", "Paper", "Cardboard", "Metal", "Glass", "Trash"] {
        let none = ItemAttributes::new();
        assert_eq!(
            resolve(&table, material, &none, Some("Gotham City")).action,
            resolve(&table, material, &none, None).action,
            "material {}",
            material
        );
    }
}

#[test]
fn test_lookup_is_case_insensitive() {
    let table = builtin();
    let none = ItemAttributes::new();
    let upper = resolve(&table, "PLASTIC", &none, Some("Austin"));
    let lower = resolve(&table, "plastic", &none, Some("austin"));

    assert_eq!(upper.action, lower.action);
    assert_eq!(upper.rationale, lower.rationale);
    assert_eq!(upper.rationale, "Plastic → Recyclable (Austin)");
}

#[test]
fn test_first_attribute_in_priority_wins() {
    let table = RuleTable::new(LocaleRules::new().with_material(
        "Cup",
        MaterialRule::new("Recyclable")
            .with_override(Attribute::GreasyOrWet, "Compost")
            .with_override(Attribute::Foam, "Landfill"),
    ));

    let forward = attrs(json!({"foam": true, "greasy_or_wet": true}));
    let reverse = attrs(json!({"greasy_or_wet": "yes", "foam": 1}));

    assert_eq!(resolve(&table, "Cup", &forward, None).action, "Landfill");
    assert_eq!(resolve(&table, "Cup", &reverse, None).action, "Landfill");
    assert_eq!(
        resolve(&table, "Cup", &attrs(json!({"greasy_or_wet": true})), None).action,
        "Compost"
    );
}

#[test]
fn test_unknown_attribute_never_overrides() {
    let table = builtin();
    let resolution = resolve(&table, "Glass", &attrs(json!({"default": true, "sparkly": true})), None);
    assert_eq!(resolution.action, "Recyclable");
    assert!(resolution.attribute.is_none());
}

#[test]
fn test_resolve_is_idempotent() {
    let table = builtin();
    let a = attrs(json!({"soft_bag": "on"}));
    assert_eq!(
        resolve(&table, "plastic", &a, Some("Seattle, WA")),
        resolve(&table, "plastic", &a, Some("Seattle, WA"))
    );
}

#[test]
fn test_gate_boundary() {
    let gate = ConfidenceGate::default();
    let eps = 1e-6;
    assert_eq!(gate.check(DEFAULT_CONFIDENCE_THRESHOLD - eps), GateDecision::Abstain);
    assert_eq!(gate.check(DEFAULT_CONFIDENCE_THRESHOLD), GateDecision::Proceed);
    assert_eq!(gate.check(DEFAULT_CONFIDENCE_THRESHOLD + eps), GateDecision::Proceed);
}

#[test]
fn test_normalizer_coverage() {
    let cases = [
        ("", NormalizedCategory::Other),
        ("RECYCLE NOW", NormalizedCategory::Recyclable),
        ("needs compost", NormalizedCategory::Compost),
        ("curbside trash", NormalizedCategory::Landfill),
        ("not sure", NormalizedCategory::Unsure),
        ("foo", NormalizedCategory::Other),
    ];
    for (raw, expected) in cases {
        assert_eq!(normalize(raw), expected, "input {:?}", raw);
    }
}

#[test]
fn test_empty_history_summary() {
    let today = chrono::NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
    let summary = Summary::build(Vec::new(), Vec::new(), today);

    assert_eq!(summary.total, 0);
    assert_eq!(summary.per_day.len(), 14);
    assert!(summary.per_day.values().all(|day| day.sum() == 0));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["per_day"]["2025-06-18"]["Unsure"], 0);
    assert_eq!(json["totals"].as_object().unwrap().len(), 5);
}

#[test]
fn test_soft_plastic_in_austin_goes_to_drop_off() {
    let resolution = resolve(&builtin(), "Plastic", &attrs(json!({"soft_bag": true})), Some("Austin, TX"));

    assert_eq!(resolution.action, "Drop-off");
    for needle in ["Plastic", "Soft bag", "Drop-off", "Austin"] {
        assert!(
            resolution.rationale.contains(needle),
            "{:?} missing {:?}",
            resolution.rationale,
            needle
        );
    }
}

#[test]
fn test_greasy_paper_depends_on_city() {
    let table = builtin();
    let greasy = attrs(json!({"greasy_or_wet": "yes"}));

    assert_eq!(resolve(&table, "Paper", &greasy, Some("new york")).action, "Landfill");
    assert_eq!(resolve(&table, "Paper", &greasy, Some("austin")).action, "Compost");
}

#[test]
fn test_engine_end_to_end_with_builtin_policy() {
    let engine = DecisionEngine::new(PolicyConfig::builtin().unwrap(), ConfidenceGate::default());
    let soft = attrs(json!({"soft_bag": true}));

    let decision = engine.decide("Plastic", 0.91, &soft, Some("Austin, TX")).unwrap();
    assert_eq!(decision.action, "Drop-off");
    assert!(!decision.abstained);
    assert!(!decision.tip.is_empty());
    assert_eq!(decision.locale.key(), "austin");

    let low = engine.decide("Plastic", 0.74, &soft, Some("Austin, TX")).unwrap();
    assert!(low.abstained);
    assert_eq!(low.action, "Unsure");
    assert_eq!(low.category, NormalizedCategory::Unsure);
}

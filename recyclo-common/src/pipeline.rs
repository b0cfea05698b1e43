//! Decision pipeline
//!
//! gate → policy resolver → tip selector → outcome normalizer.
//! [`DecisionEngine`] holds the immutable policy and is shared behind an
//! `Arc` by request handlers.

use crate::attrs::ItemAttributes;
use crate::classifier::confidence_text;
use crate::config::PolicyConfig;
use crate::gate::{check_confidence, ConfidenceGate, GateDecision, ABSTAIN_ACTION, ABSTAIN_RATIONALE};
use crate::locale::Locale;
use crate::outcome::{normalize, NormalizedCategory};
use crate::policy::resolve;
use crate::rules::RuleTable;
use crate::tips::TipBook;
use crate::{Error, Result};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

/// Response for one classification attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub material: String,
    pub action: String,
    pub rationale: String,
    pub confidence: f64,
    pub confidence_text: String,
    pub tip: String,
    pub abstained: bool,
    /// Reporting category of `action`
    #[serde(skip)]
    pub category: NormalizedCategory,
    #[serde(skip)]
    pub locale: Locale,
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    rules: RuleTable,
    tips: TipBook,
    gate: ConfidenceGate,
}

impl DecisionEngine {
    pub fn new(policy: PolicyConfig, gate: ConfidenceGate) -> Self {
        Self {
            rules: policy.rules,
            tips: policy.tips,
            gate,
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn tips(&self) -> &TipBook {
        &self.tips
    }

    pub fn gate(&self) -> &ConfidenceGate {
        &self.gate
    }

    /// Run one decision with the thread-local RNG
    pub fn decide(
        &self,
        material: &str,
        confidence: f64,
        attrs: &ItemAttributes,
        locale: Option<&str>,
    ) -> Result<Decision> {
        self.decide_with_rng(material, confidence, attrs, locale, &mut rand::thread_rng())
    }

    /// Run one decision.
    ///
    /// Fails only on caller errors: blank material or a confidence that is
    /// not a probability.
    pub fn decide_with_rng<R: Rng + ?Sized>(
        &self,
        material: &str,
        confidence: f64,
        attrs: &ItemAttributes,
        locale: Option<&str>,
        rng: &mut R,
    ) -> Result<Decision> {
        let material = material.trim();
        if material.is_empty() {
            return Err(Error::InvalidInput("material_label is required".to_string()));
        }
        let confidence = check_confidence(confidence)?;

        let decision = match self.gate.check(confidence) {
            GateDecision::Abstain => Decision {
                material: material.to_string(),
                action: ABSTAIN_ACTION.to_string(),
                rationale: ABSTAIN_RATIONALE.to_string(),
                confidence,
                confidence_text: confidence_text(confidence, true),
                tip: self
                    .tips
                    .pick_with(ABSTAIN_ACTION, ABSTAIN_ACTION, rng)
                    .to_string(),
                abstained: true,
                category: NormalizedCategory::Unsure,
                locale: Locale::normalize(locale),
            },
            GateDecision::Proceed => {
                let resolution = resolve(&self.rules, material, attrs, locale);
                let tip = self
                    .tips
                    .pick_with(&resolution.material, &resolution.action, rng)
                    .to_string();
                Decision {
                    category: normalize(&resolution.action),
                    material: resolution.material,
                    action: resolution.action,
                    rationale: resolution.rationale,
                    confidence,
                    confidence_text: confidence_text(confidence, false),
                    tip,
                    abstained: false,
                    locale: resolution.locale,
                }
            }
        };

        debug!(
            "Decision: {} @ {:.3} in {} -> {} (abstained: {})",
            decision.material, confidence, decision.locale, decision.action, decision.abstained
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::Attribute;
    use crate::gate::DEFAULT_CONFIDENCE_THRESHOLD;
    use crate::rules::{LocaleRules, MaterialRule};
    use crate::tips::GENERIC_TIP;

    fn engine() -> DecisionEngine {
        let rules = RuleTable::new(
            LocaleRules::new()
                .with_material(
                    "Plastic",
                    MaterialRule::new("Recyclable").with_override(Attribute::SoftBag, "Drop-off"),
                )
                .with_material("Trash", MaterialRule::new("Landfill")),
        );
        let tips = TipBook::new()
            .with_tips("Plastic", &["rinse it"])
            .with_tips("Unsure", &["retake the photo"]);
        DecisionEngine::new(PolicyConfig { rules, tips }, ConfidenceGate::default())
    }

    #[test]
    fn test_abstain_skips_resolver() {
        let d = engine().decide("Plastic", 0.4, &ItemAttributes::new(), Some("Austin")).unwrap();
        assert!(d.abstained);
        assert_eq!(d.material, "Plastic");
        assert_eq!(d.action, "Unsure");
        assert_eq!(d.rationale, ABSTAIN_RATIONALE);
        assert_eq!(d.tip, "retake the photo");
        assert_eq!(d.category, NormalizedCategory::Unsure);
        assert_eq!(d.confidence_text, "40.0 % (low)");
    }

    #[test]
    fn test_proceed_at_threshold() {
        let attrs = ItemAttributes::new().with(Attribute::SoftBag);
        let d = engine()
            .decide("plastic", DEFAULT_CONFIDENCE_THRESHOLD, &attrs, None)
            .unwrap();
        assert!(!d.abstained);
        assert_eq!(d.material, "Plastic");
        assert_eq!(d.action, "Drop-off");
        assert_eq!(d.tip, "rinse it");
        assert_eq!(d.category, NormalizedCategory::Other);
        assert_eq!(d.confidence_text, "75.0 % Confidence Score");
    }

    #[test]
    fn test_unknown_material_uses_trash() {
        let d = engine().decide("Styrofoam", 0.9, &ItemAttributes::new(), None).unwrap();
        assert_eq!(d.material, "Trash");
        assert_eq!(d.action, "Landfill");
        assert_eq!(d.category, NormalizedCategory::Landfill);
        assert_eq!(d.tip, GENERIC_TIP);
    }

    #[test]
    fn test_caller_errors() {
        let engine = engine();
        let attrs = ItemAttributes::new();
        assert!(matches!(engine.decide("  ", 0.9, &attrs, None), Err(Error::InvalidInput(_))));
        assert!(matches!(engine.decide("Glass", 1.2, &attrs, None), Err(Error::InvalidInput(_))));
        assert!(matches!(
            engine.decide("Glass", f64::NAN, &attrs, None),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_serialized_fields() {
        let d = engine().decide("Plastic", 0.9, &ItemAttributes::new(), None).unwrap();
        let json = serde_json::to_value(&d).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["abstained", "action", "confidence", "confidence_text", "material", "rationale", "tip"]
        );
    }
}

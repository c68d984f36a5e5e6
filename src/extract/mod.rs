pub mod labeled;
pub mod literal;
pub mod proximity;
pub mod structural;

use tracing::debug;

use crate::merge::ExtractionMerger;
use crate::models::{FieldKey, FieldMap, RawDocument};

pub use literal::LiteralOverrides;

/// One extraction strategy: a pure function from a document snapshot to a
/// sparse field map. Not finding a field is absence, not an error, and a
/// strategy that cannot run against this document (no DOM, no overrides)
/// simply returns nothing.
pub trait ExtractionStrategy {
    fn name(&self) -> &'static str;

    /// `wanted` is the set of keys no earlier strategy has claimed; a strategy
    /// may ignore it, but must never expect its output to override an earlier
    /// strategy's value.
    fn extract(&self, doc: &RawDocument, wanted: &[FieldKey]) -> FieldMap;
}

/// Ordered list of strategies, most specific first. Per field the first
/// strategy whose value survives normalization wins; later strategies are
/// never consulted for that field again.
pub struct FieldExtractorCascade {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    merger: ExtractionMerger,
}

impl FieldExtractorCascade {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self {
            strategies,
            merger: ExtractionMerger::new(),
        }
    }

    /// Standard cascade for a facility contact page. The literal-override
    /// strategy is only present when the caller supplies verified values for
    /// this target.
    pub fn for_contact_page(overrides: Option<literal::LiteralOverrideStrategy>) -> Self {
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> = Vec::new();
        if let Some(literal) = overrides {
            strategies.push(Box::new(literal));
        }
        strategies.push(Box::new(labeled::LabeledFieldStrategy::new()));
        strategies.push(Box::new(proximity::ProximityStrategy::new()));
        strategies.push(Box::new(structural::StructuralDomStrategy::new()));
        Self::new(strategies)
    }

    pub fn run(&self, doc: &RawDocument, keys: &[FieldKey]) -> FieldMap {
        let mut merged = FieldMap::new();

        for strategy in &self.strategies {
            let wanted: Vec<FieldKey> = keys
                .iter()
                .copied()
                .filter(|k| !merged.contains_key(k))
                .collect();
            if wanted.is_empty() {
                break;
            }

            let found = strategy.extract(doc, &wanted);
            if !found.is_empty() {
                debug!("Strategy {} produced {} field(s)", strategy.name(), found.len());
            }
            self.merger.absorb(&mut merged, found);
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, ExtractedField, Provenance};

    struct Fixed {
        name: &'static str,
        key: FieldKey,
        value: &'static str,
        provenance: Provenance,
    }

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn extract(&self, _doc: &RawDocument, wanted: &[FieldKey]) -> FieldMap {
            let mut map = FieldMap::new();
            if wanted.contains(&self.key) {
                map.insert(
                    self.key,
                    ExtractedField {
                        value: self.value.to_string(),
                        provenance: self.provenance,
                        confidence: Confidence::Pattern,
                    },
                );
            }
            map
        }
    }

    #[test]
    fn earlier_strategy_wins_per_field() {
        let cascade = FieldExtractorCascade::new(vec![
            Box::new(Fixed {
                name: "first",
                key: FieldKey::Phone,
                value: "587-315-1181",
                provenance: Provenance::LabeledPattern,
            }),
            Box::new(Fixed {
                name: "second",
                key: FieldKey::Phone,
                value: "000-000-0000",
                provenance: Provenance::Proximity,
            }),
        ]);

        let doc = RawDocument::text_only("irrelevant".to_string(), true);
        let map = cascade.run(&doc, FieldKey::contact_keys());

        let field = &map[&FieldKey::Phone];
        assert_eq!(field.value, "587-315-1181");
        assert_eq!(field.provenance, Provenance::LabeledPattern);
    }

    #[test]
    fn later_strategy_fills_gaps() {
        let cascade = FieldExtractorCascade::new(vec![
            Box::new(Fixed {
                name: "first",
                key: FieldKey::Phone,
                value: "587-315-1181",
                provenance: Provenance::LabeledPattern,
            }),
            Box::new(Fixed {
                name: "second",
                key: FieldKey::Language,
                value: "English",
                provenance: Provenance::Proximity,
            }),
        ]);

        let doc = RawDocument::text_only("irrelevant".to_string(), true);
        let map = cascade.run(&doc, FieldKey::contact_keys());

        assert_eq!(map.len(), 2);
        assert_eq!(map[&FieldKey::Language].value, "English");
    }

    #[test]
    fn cascade_is_idempotent_on_same_document() {
        let page = r#"
            <h2>Contact information</h2>
            Colin Hennel
            Position: Manager, HSE and Regulatory
            Phone: 587-315-1181
            Email: chennel@pinecliffenergy.com
        "#;
        let cascade = FieldExtractorCascade::for_contact_page(None);
        let doc = RawDocument::with_dom(page.to_string(), true);

        let first = cascade.run(&doc, FieldKey::contact_keys());
        let second = cascade.run(&doc, FieldKey::contact_keys());
        assert_eq!(first, second);
    }
}

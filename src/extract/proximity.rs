use regex::Regex;

use crate::extract::ExtractionStrategy;
use crate::models::{Confidence, ExtractedField, FieldKey, FieldMap, Provenance, RawDocument};

/// The contact name carries no label of its own on the facility page: it sits
/// between the "Contact information" heading and the "Position:" label. This
/// strategy matches a two-capitalized-word token in that neighbourhood, at
/// heuristic confidence.
pub struct ProximityStrategy {
    name_before_position: Regex,
    name_after_heading: Regex,
}

impl ProximityStrategy {
    pub fn new() -> Self {
        Self {
            name_before_position: Regex::new(
                r"([A-Z][a-z]+ [A-Z][a-z]+)\s*(?:<[^>]+>\s*|\{\{[^}]*\}\}\s*)*Position:",
            )
            .unwrap(),
            name_after_heading: Regex::new(
                r"(?i:Contact information)(?:\s|<[^>]+>|\{\{[^}]*\}\})*([A-Z][a-z]+ [A-Z][a-z]+)",
            )
            .unwrap(),
        }
    }
}

impl Default for ProximityStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for ProximityStrategy {
    fn name(&self) -> &'static str {
        "proximity"
    }

    fn extract(&self, doc: &RawDocument, wanted: &[FieldKey]) -> FieldMap {
        let mut map = FieldMap::new();
        if !wanted.contains(&FieldKey::ContactName) {
            return map;
        }

        let name = self
            .name_before_position
            .captures(doc.markup())
            .or_else(|| self.name_after_heading.captures(doc.markup()))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        if let Some(value) = name {
            map.insert(
                FieldKey::ContactName,
                ExtractedField {
                    value,
                    provenance: Provenance::Proximity,
                    confidence: Confidence::Heuristic,
                },
            );
        }

        map
    }
}

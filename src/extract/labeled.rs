use regex::Regex;

use crate::extract::ExtractionStrategy;
use crate::models::{Confidence, ExtractedField, FieldKey, FieldMap, Provenance, RawDocument};

/// One declarative pattern per field, anchored on the field's human-readable
/// label as it renders on a facility page. Patterns tolerate markup and
/// unresolved `{{ ... }}` template tokens between label and value; the
/// normalizer cleans whatever is captured.
pub struct LabeledFieldStrategy {
    patterns: Vec<(FieldKey, Regex)>,
}

impl LabeledFieldStrategy {
    pub fn new() -> Self {
        let patterns = vec![
            (
                FieldKey::Position,
                Regex::new(r"(?i)Position:\s*(.+?)\s*(?:Phone:|Email:|Contact language:|$)")
                    .unwrap(),
            ),
            (
                FieldKey::Phone,
                Regex::new(r"(?i)Phone:\s*(?:\{\{[^}]*\}\}\s*)*(?:<[^>]+>\s*)*([0-9()\-. ]{7,})")
                    .unwrap(),
            ),
            (
                FieldKey::Email,
                Regex::new(
                    r"(?i)Email:\s*(?:\{\{[^}]*\}\}\s*)*(?:<[^>]+>\s*)*([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})",
                )
                .unwrap(),
            ),
            (
                FieldKey::Language,
                Regex::new(
                    r"(?i)Contact language:\s*(?:\{\{[^}]*\}\}\s*)*(?:<[^>]+>\s*)*([A-Za-z]+)",
                )
                .unwrap(),
            ),
            (
                FieldKey::BusinessNumber,
                Regex::new(r"(?i)Business number\D{0,400}?(\d{9})\b").unwrap(),
            ),
            (
                FieldKey::EmployeeCount,
                Regex::new(r"(?i)Number of full-time employee equivalents\D{0,400}?(\d+)\b")
                    .unwrap(),
            ),
        ];
        Self { patterns }
    }
}

impl Default for LabeledFieldStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for LabeledFieldStrategy {
    fn name(&self) -> &'static str {
        "labeled_pattern"
    }

    fn extract(&self, doc: &RawDocument, wanted: &[FieldKey]) -> FieldMap {
        let mut map = FieldMap::new();

        for (key, pattern) in &self.patterns {
            if !wanted.contains(key) {
                continue;
            }
            if let Some(captures) = pattern.captures(doc.markup()) {
                if let Some(value) = captures.get(1) {
                    map.insert(
                        *key,
                        ExtractedField {
                            value: value.as_str().to_string(),
                            provenance: Provenance::LabeledPattern,
                            confidence: Confidence::Pattern,
                        },
                    );
                }
            }
        }

        map
    }
}

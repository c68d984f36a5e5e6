use crate::models::{ExtractedField, ExtractionOutcome, FieldKey, FieldMap};
use crate::normalize::FieldNormalizer;

/// Any one of these is enough to call a record usable.
const REQUIRED_ANY: [FieldKey; 3] = [FieldKey::ContactName, FieldKey::Phone, FieldKey::Email];

/// Folds per-strategy output into the accumulated field map and classifies
/// the final result. First writer wins: a key already present is never
/// overwritten, so strategy order is the only precedence mechanism.
pub struct ExtractionMerger {
    normalizer: FieldNormalizer,
}

impl ExtractionMerger {
    pub fn new() -> Self {
        Self {
            normalizer: FieldNormalizer::new(),
        }
    }

    /// Normalizes each incoming value and inserts it if its key is still
    /// unclaimed. A value the normalizer rejects does not claim the key, so a
    /// later strategy may still fill it.
    pub fn absorb(&self, merged: &mut FieldMap, found: FieldMap) {
        for (key, field) in found {
            if merged.contains_key(&key) {
                continue;
            }
            if let Some(value) = self.normalizer.normalize(key, &field.value) {
                merged.insert(
                    key,
                    ExtractedField {
                        value,
                        provenance: field.provenance,
                        confidence: field.confidence,
                    },
                );
            }
        }
    }

    /// Success needs at least one of {contact_name, phone, email}; anything
    /// at all is Partial; an empty map is Failure. No field is ever invented
    /// here — Success does not imply completeness.
    pub fn classify(&self, fields: FieldMap) -> ExtractionOutcome {
        if REQUIRED_ANY.iter().any(|k| fields.contains_key(k)) {
            return ExtractionOutcome::Success { fields };
        }
        if !fields.is_empty() {
            let missing = REQUIRED_ANY
                .iter()
                .copied()
                .filter(|k| !fields.contains_key(k))
                .collect();
            return ExtractionOutcome::Partial { fields, missing };
        }
        ExtractionOutcome::Failure {
            reason: "no usable content in rendered page".to_string(),
        }
    }
}

impl Default for ExtractionMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, Provenance};

    fn field(value: &str) -> ExtractedField {
        ExtractedField {
            value: value.to_string(),
            provenance: Provenance::LabeledPattern,
            confidence: Confidence::Pattern,
        }
    }

    fn map(entries: &[(FieldKey, &str)]) -> FieldMap {
        entries.iter().map(|(k, v)| (*k, field(v))).collect()
    }

    #[test]
    fn phone_alone_is_success() {
        let merger = ExtractionMerger::new();
        let outcome = merger.classify(map(&[(FieldKey::Phone, "587-315-1181")]));
        assert!(outcome.is_success());
    }

    #[test]
    fn name_and_position_is_success() {
        let merger = ExtractionMerger::new();
        let outcome = merger.classify(map(&[
            (FieldKey::ContactName, "Colin Hennel"),
            (FieldKey::Position, "Manager, HSE and Regulatory"),
        ]));
        assert!(outcome.is_success());
    }

    #[test]
    fn employee_count_alone_is_partial() {
        let merger = ExtractionMerger::new();
        let outcome = merger.classify(map(&[(FieldKey::EmployeeCount, "1")]));
        match outcome {
            ExtractionOutcome::Partial { missing, .. } => {
                assert_eq!(
                    missing,
                    vec![FieldKey::ContactName, FieldKey::Phone, FieldKey::Email]
                );
            }
            other => panic!("expected Partial, got {:?}", other),
        }
    }

    #[test]
    fn empty_map_is_failure() {
        let merger = ExtractionMerger::new();
        assert!(matches!(
            merger.classify(FieldMap::new()),
            ExtractionOutcome::Failure { .. }
        ));
    }

    #[test]
    fn absorb_strips_markup_around_phone() {
        let merger = ExtractionMerger::new();
        let mut merged = FieldMap::new();
        merger.absorb(
            &mut merged,
            map(&[(FieldKey::Phone, "<strong>587-315-1181</strong>")]),
        );
        assert_eq!(merged[&FieldKey::Phone].value, "587-315-1181");
    }

    #[test]
    fn absorb_never_overwrites() {
        let merger = ExtractionMerger::new();
        let mut merged = map(&[(FieldKey::Email, "chennel@pinecliffenergy.com")]);
        merger.absorb(&mut merged, map(&[(FieldKey::Email, "other@example.com")]));
        assert_eq!(merged[&FieldKey::Email].value, "chennel@pinecliffenergy.com");
    }

    #[test]
    fn rejected_value_leaves_key_open_for_later_strategy() {
        let merger = ExtractionMerger::new();
        let mut merged = FieldMap::new();
        // Malformed email does not claim the key.
        merger.absorb(&mut merged, map(&[(FieldKey::Email, "not-an-email")]));
        assert!(merged.is_empty());
        merger.absorb(&mut merged, map(&[(FieldKey::Email, "chennel@pinecliffenergy.com")]));
        assert_eq!(merged[&FieldKey::Email].value, "chennel@pinecliffenergy.com");
    }
}

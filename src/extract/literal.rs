use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::info;

use crate::extract::ExtractionStrategy;
use crate::models::{
    Confidence, ExtractedField, FieldKey, FieldMap, Provenance, RawDocument, Result,
};

/// Externally supplied table of field values verified once out-of-band, keyed
/// by registry id. Exists for pages whose template renders differently than
/// anticipated but whose content is already known. Loaded from YAML:
///
/// ```yaml
/// "1368":
///   contact_name: "Colin Hennel"
///   phone: "587-315-1181"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiteralOverrides(BTreeMap<String, BTreeMap<FieldKey, String>>);

impl LiteralOverrides {
    pub async fn load(path: &str) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let overrides: LiteralOverrides = serde_yaml::from_str(&content)?;
        info!("Loaded literal overrides for {} target(s)", overrides.0.len());
        Ok(overrides)
    }

    /// Strategy instance for one target, or None when no overrides exist for
    /// it — in which case the cascade simply runs without this layer.
    pub fn strategy_for(&self, registry_id: &str) -> Option<LiteralOverrideStrategy> {
        self.0.get(registry_id).map(|entries| LiteralOverrideStrategy {
            entries: entries.clone(),
        })
    }
}

/// Highest-precedence strategy: emits a pre-verified value verbatim, but only
/// when the exact string is actually present in the rendered markup. Presence
/// is the check; the page still has to corroborate the known value.
pub struct LiteralOverrideStrategy {
    entries: BTreeMap<FieldKey, String>,
}

impl ExtractionStrategy for LiteralOverrideStrategy {
    fn name(&self) -> &'static str {
        "literal_override"
    }

    fn extract(&self, doc: &RawDocument, wanted: &[FieldKey]) -> FieldMap {
        let mut map = FieldMap::new();

        for (key, value) in &self.entries {
            if wanted.contains(key) && doc.markup().contains(value.as_str()) {
                map.insert(
                    *key,
                    ExtractedField {
                        value: value.clone(),
                        provenance: Provenance::LiteralOverride,
                        confidence: Confidence::Exact,
                    },
                );
            }
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides() -> LiteralOverrides {
        serde_yaml::from_str(
            r#"
"1368":
  contact_name: "Colin Hennel"
  phone: "587-315-1181"
"#,
        )
        .unwrap()
    }

    #[test]
    fn emits_known_value_only_when_present_in_markup() {
        let strategy = overrides().strategy_for("1368").unwrap();
        let doc = RawDocument::text_only(
            "<div>Colin Hennel ... something else</div>".to_string(),
            true,
        );

        let map = strategy.extract(&doc, FieldKey::contact_keys());
        assert_eq!(map[&FieldKey::ContactName].value, "Colin Hennel");
        assert_eq!(map[&FieldKey::ContactName].confidence, Confidence::Exact);
        // Known phone is not on this page, so it is not emitted.
        assert!(!map.contains_key(&FieldKey::Phone));
    }

    #[test]
    fn unknown_target_has_no_strategy() {
        assert!(overrides().strategy_for("9999").is_none());
    }
}

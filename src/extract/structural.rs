use scraper::Selector;

use crate::extract::ExtractionStrategy;
use crate::models::{Confidence, ExtractedField, FieldKey, FieldMap, Provenance, RawDocument};

/// Reads label/value table rows from the live DOM. Runs only when the
/// document exposes DOM query capability; on a raw-text snapshot it is
/// skipped, not failed. Label matching is case-insensitive and keyed on the
/// distinctive fragment of each row label.
pub struct StructuralDomStrategy {
    row_selector: Selector,
    cell_selector: Selector,
}

impl StructuralDomStrategy {
    pub fn new() -> Self {
        Self {
            row_selector: Selector::parse("tr").unwrap(),
            cell_selector: Selector::parse("th, td").unwrap(),
        }
    }

    fn key_for_label(label: &str) -> Option<FieldKey> {
        let label = label.to_lowercase();
        if label.contains("business number") {
            Some(FieldKey::BusinessNumber)
        } else if label.contains("employee") {
            Some(FieldKey::EmployeeCount)
        } else if label.contains("position") {
            Some(FieldKey::Position)
        } else if label.contains("phone") {
            Some(FieldKey::Phone)
        } else if label.contains("email") {
            Some(FieldKey::Email)
        } else if label.contains("language") {
            Some(FieldKey::Language)
        } else {
            None
        }
    }
}

impl Default for StructuralDomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for StructuralDomStrategy {
    fn name(&self) -> &'static str {
        "structural_dom"
    }

    fn extract(&self, doc: &RawDocument, wanted: &[FieldKey]) -> FieldMap {
        let mut map = FieldMap::new();

        let dom = match doc.dom() {
            Some(dom) => dom,
            None => return map,
        };

        for row in dom.select(&self.row_selector) {
            let cells: Vec<String> = row
                .select(&self.cell_selector)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect();
            if cells.len() < 2 {
                continue;
            }

            let Some(key) = Self::key_for_label(&cells[0]) else {
                continue;
            };
            if !wanted.contains(&key) || map.contains_key(&key) {
                continue;
            }

            if let Some(value) = cells[1..].iter().find(|v| !v.is_empty()) {
                map.insert(
                    key,
                    ExtractedField {
                        value: value.clone(),
                        provenance: Provenance::StructuralDom,
                        confidence: Confidence::Pattern,
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

    const PAGE: &str = r#"
        <table>
            <tr><td>Business number</td><td>863108833</td></tr>
            <tr><td>Number of full-time employee equivalents</td><td>1</td></tr>
            <tr><td>Phone</td><td>587-315-1181</td></tr>
        </table>
    "#;

    #[test]
    fn reads_sibling_cells_by_row_label() {
        let doc = RawDocument::with_dom(PAGE.to_string(), true);
        let map = StructuralDomStrategy::new().extract(&doc, FieldKey::contact_keys());

        assert_eq!(map[&FieldKey::BusinessNumber].value, "863108833");
        assert_eq!(map[&FieldKey::EmployeeCount].value, "1");
        assert_eq!(map[&FieldKey::Phone].value, "587-315-1181");
    }

    #[test]
    fn skipped_without_dom_capability() {
        let doc = RawDocument::text_only(PAGE.to_string(), true);
        let map = StructuralDomStrategy::new().extract(&doc, FieldKey::contact_keys());
        assert!(map.is_empty());
    }

    #[test]
    fn unrelated_rows_are_ignored() {
        let doc = RawDocument::with_dom(
            "<table><tr><td>Latitude</td><td>51.2</td></tr></table>".to_string(),
            true,
        );
        let map = StructuralDomStrategy::new().extract(&doc, FieldKey::contact_keys());
        assert!(map.is_empty());
    }
}

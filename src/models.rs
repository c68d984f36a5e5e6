use std::collections::BTreeMap;

use scraper::Html;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// The closed set of fields the extraction pipeline knows about.
/// Strategies never invent keys outside this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    ContactName,
    Position,
    Phone,
    Email,
    Language,
    BusinessNumber,
    EmployeeCount,
    RegistryId,
}

impl FieldKey {
    pub const ALL: [FieldKey; 8] = [
        FieldKey::ContactName,
        FieldKey::Position,
        FieldKey::Phone,
        FieldKey::Email,
        FieldKey::Language,
        FieldKey::BusinessNumber,
        FieldKey::EmployeeCount,
        FieldKey::RegistryId,
    ];

    /// Keys extracted from a facility detail page. The registry id is resolved
    /// earlier, from the search listing, so the contact cascade never asks for it.
    pub fn contact_keys() -> &'static [FieldKey] {
        &[
            FieldKey::ContactName,
            FieldKey::Position,
            FieldKey::Phone,
            FieldKey::Email,
            FieldKey::Language,
            FieldKey::BusinessNumber,
            FieldKey::EmployeeCount,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::ContactName => "contact_name",
            FieldKey::Position => "position",
            FieldKey::Phone => "phone",
            FieldKey::Email => "email",
            FieldKey::Language => "language",
            FieldKey::BusinessNumber => "business_number",
            FieldKey::EmployeeCount => "employee_count",
            FieldKey::RegistryId => "registry_id",
        }
    }
}

/// Which strategy produced a value. Recorded for precedence and diagnostics,
/// never exposed as a correctness guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    LiteralOverride,
    LabeledPattern,
    Proximity,
    StructuralDom,
}

/// Exact > Pattern > Heuristic, used only to order precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Heuristic,
    Pattern,
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedField {
    pub value: String,
    pub provenance: Provenance,
    pub confidence: Confidence,
}

/// Sparse by design: a key is present only when some strategy found a value
/// that survived normalization. Absence is meaningful, not an error.
pub type FieldMap = BTreeMap<FieldKey, ExtractedField>;

/// Final classification of one extraction attempt.
///
/// Success requires at least one of {contact_name, phone, email}; Partial means
/// something was found but none of those; Failure means the cascade produced
/// nothing usable. The reporting layer treats Partial as retry-worthy and
/// Failure as "page likely has no usable structure".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Success { fields: FieldMap },
    Partial { fields: FieldMap, missing: Vec<FieldKey> },
    Failure { reason: String },
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Success { .. })
    }

    pub fn fields(&self) -> Option<&FieldMap> {
        match self {
            ExtractionOutcome::Success { fields } | ExtractionOutcome::Partial { fields, .. } => {
                Some(fields)
            }
            ExtractionOutcome::Failure { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtractionOutcome::Success { .. } => "success",
            ExtractionOutcome::Partial { .. } => "partial",
            ExtractionOutcome::Failure { .. } => "failure",
        }
    }
}

/// Snapshot of one rendered page, captured once per attempt and discarded
/// after the cascade runs. Holds raw markup only; the DOM is re-parsed on
/// demand so the snapshot stays immutable and cheap to move across awaits.
#[derive(Debug, Clone)]
pub struct RawDocument {
    markup: String,
    dom_available: bool,
    content_detected: bool,
}

impl RawDocument {
    pub fn with_dom(markup: String, content_detected: bool) -> Self {
        Self {
            markup,
            dom_available: true,
            content_detected,
        }
    }

    /// Raw-text snapshot without DOM query capability. Strategies that need a
    /// DOM are skipped, not failed.
    pub fn text_only(markup: String, content_detected: bool) -> Self {
        Self {
            markup,
            dom_available: false,
            content_detected,
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn content_detected(&self) -> bool {
        self.content_detected
    }

    pub fn dom(&self) -> Option<Html> {
        if self.dom_available {
            Some(Html::parse_document(&self.markup))
        } else {
            None
        }
    }
}

/// One row of the final report: everything the serialization layer sees.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyRecord {
    pub company_name: String,
    pub registry_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidate_ids: Vec<String>,
    pub fields: BTreeMap<&'static str, String>,
    pub outcome: String,
    pub success: bool,
    pub scraped_at: String,
}

impl CompanyRecord {
    pub fn from_outcome(
        company_name: &str,
        registry_id: Option<String>,
        candidate_ids: Vec<String>,
        outcome: &ExtractionOutcome,
    ) -> Self {
        let fields = outcome
            .fields()
            .map(|map| {
                map.iter()
                    .map(|(k, f)| (k.as_str(), f.value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            company_name: company_name.to_string(),
            registry_id,
            candidate_ids,
            fields,
            outcome: outcome.label().to_string(),
            success: outcome.is_success(),
            scraped_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

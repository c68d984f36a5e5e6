use tracing::{info, warn};

use crate::config::ScrapingConfig;
use crate::extract::{FieldExtractorCascade, LiteralOverrides};
use crate::fetcher::PageFetcher;
use crate::merge::ExtractionMerger;
use crate::models::{ExtractionOutcome, FieldKey, RawDocument, Result};
use crate::readiness::{wait_for_content, ReadinessConfig};
use crate::resolver::{IdentifierResolver, ResolverOutcome};

/// Signals that the search listing has rendered its results table.
const LISTING_ANCHORS: [&str; 3] = ["NPRI", "<table", "Download as CSV"];

/// Wires one company attempt end to end: readiness wait, cascade,
/// normalization, merge, classification. Each attempt captures its own
/// document snapshot and discards it on every exit path; nothing is shared
/// across companies.
pub struct ContactPipeline<'a> {
    fetcher: &'a PageFetcher,
    readiness: ReadinessConfig,
    resolver: IdentifierResolver,
    merger: ExtractionMerger,
    overrides: Option<&'a LiteralOverrides>,
}

impl<'a> ContactPipeline<'a> {
    pub fn new(
        fetcher: &'a PageFetcher,
        config: &ScrapingConfig,
        overrides: Option<&'a LiteralOverrides>,
    ) -> Self {
        Self {
            fetcher,
            readiness: ReadinessConfig::from_scraping(config),
            resolver: IdentifierResolver::new(config.report_year),
            merger: ExtractionMerger::new(),
            overrides,
        }
    }

    /// Resolve the registry id from the company's search listing. Errors here
    /// are collaborator failures (page never readable); a listing without a
    /// usable id is a normal `Candidates`/`Exhausted` outcome, not an error.
    pub async fn resolve_identifier(&self, company_name: &str) -> Result<ResolverOutcome> {
        let url = self.fetcher.search_url(company_name)?;
        let probe = self.fetcher.probe(&url);

        let mut config = self.readiness.clone();
        config.anchors = LISTING_ANCHORS.iter().map(|s| s.to_string()).collect();

        let report = wait_for_content(&probe, &config).await?;
        if !report.content_detected {
            warn!(
                "Listing for '{}' showed no content signal within budget, extracting anyway",
                company_name
            );
        }

        let doc = RawDocument::with_dom(report.markup, report.content_detected);
        Ok(self.resolver.resolve(&doc, company_name))
    }

    /// Run the full contact extraction against one facility page. Never
    /// errors: collaborator failures come back as a Failure outcome with the
    /// reason, and the caller decides whether the whole attempt is retried.
    pub async fn extract_contacts(&self, registry_id: &str) -> ExtractionOutcome {
        let url = self.fetcher.facility_url(registry_id);
        let probe = self.fetcher.probe(&url);

        let report = match wait_for_content(&probe, &self.readiness).await {
            Ok(report) => report,
            Err(e) => {
                return ExtractionOutcome::Failure {
                    reason: format!("facility page unavailable: {}", e),
                }
            }
        };

        if !report.content_detected {
            warn!(
                "No readiness signal for facility {} within budget, confidence degraded",
                registry_id
            );
        }

        let doc = RawDocument::with_dom(report.markup, report.content_detected);
        let overrides = self
            .overrides
            .and_then(|table| table.strategy_for(registry_id));
        let cascade = FieldExtractorCascade::for_contact_page(overrides);

        let fields = cascade.run(&doc, FieldKey::contact_keys());
        let outcome = self.merger.classify(fields);
        info!(
            "Facility {}: extraction {} ({} field(s))",
            registry_id,
            outcome.label(),
            outcome.fields().map(|f| f.len()).unwrap_or(0)
        );
        outcome
    }
}

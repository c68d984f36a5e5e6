use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::extract::LiteralOverrides;
use crate::fetcher::PageFetcher;
use crate::models::{CompanyRecord, ExtractionOutcome, Result};
use crate::pipeline::ContactPipeline;
use crate::report::ReportWriter;
use crate::resolver::ResolverOutcome;

/// The outer per-company loop: resolve an id, extract the contact record,
/// accumulate report rows, pause between companies. One company is processed
/// to completion before the next begins; retry policy lives here, not in the
/// pipeline, and currently amounts to the fixed inter-company delay.
pub struct Runner {
    config: Config,
    fetcher: PageFetcher,
    overrides: Option<LiteralOverrides>,
}

impl Runner {
    pub async fn new(config: Config) -> Result<Self> {
        let fetcher = PageFetcher::new(&config.scraping)?;

        let overrides = match &config.scraping.overrides_file {
            Some(path) => match LiteralOverrides::load(path).await {
                Ok(table) => Some(table),
                Err(e) => {
                    warn!("Could not load overrides from {}: {}. Continuing without.", path, e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            config,
            fetcher,
            overrides,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let companies = self.read_companies().await?;
        if companies.is_empty() {
            warn!("No companies found in {}", self.config.scraping.companies_file);
            return Ok(());
        }
        info!("Processing {} companies", companies.len());

        let pipeline = ContactPipeline::new(
            &self.fetcher,
            &self.config.scraping,
            self.overrides.as_ref(),
        );

        let mut records = Vec::new();

        for (i, company) in companies.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, companies.len(), company);

            records.push(self.process_company(&pipeline, company).await);

            if i + 1 < companies.len() {
                tokio::time::sleep(Duration::from_millis(
                    self.config.scraping.delay_between_companies_ms,
                ))
                .await;
            }
        }

        let writer = ReportWriter::new(&self.config.output.directory, self.config.output.pretty_json);
        writer.write(&records).await?;

        let successes = records.iter().filter(|r| r.success).count();
        info!(
            "Done: {}/{} companies with a usable contact record",
            successes,
            records.len()
        );
        Ok(())
    }

    async fn process_company(&self, pipeline: &ContactPipeline<'_>, company: &str) -> CompanyRecord {
        let resolved = match pipeline.resolve_identifier(company).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Identifier resolution failed for {}: {}", company, e);
                let outcome = ExtractionOutcome::Failure {
                    reason: format!("identifier resolution failed: {}", e),
                };
                return CompanyRecord::from_outcome(company, None, Vec::new(), &outcome);
            }
        };

        match resolved {
            ResolverOutcome::Found(registry_id) => {
                info!("{}: registry id {}", company, registry_id);
                let outcome = pipeline.extract_contacts(&registry_id).await;
                CompanyRecord::from_outcome(company, Some(registry_id), Vec::new(), &outcome)
            }
            ResolverOutcome::Candidates(candidates) => {
                // Low-confidence text-scan result: surfaced for manual
                // disambiguation, never auto-selected.
                warn!(
                    "{}: no confident id, {} candidate(s) need manual review",
                    company,
                    candidates.len()
                );
                let outcome = ExtractionOutcome::Failure {
                    reason: "registry id ambiguous, candidates recorded".to_string(),
                };
                CompanyRecord::from_outcome(company, None, candidates, &outcome)
            }
            ResolverOutcome::Exhausted => {
                warn!("{}: no registry id found", company);
                let outcome = ExtractionOutcome::Failure {
                    reason: "no registry id found in search listing".to_string(),
                };
                CompanyRecord::from_outcome(company, None, Vec::new(), &outcome)
            }
        }
    }

    async fn read_companies(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.config.scraping.companies_file).await?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::ScrapingConfig;
use crate::models::Result;

/// Re-readable view of one page's current content. The readiness waiter polls
/// through this seam, so tests can stand in a scripted fake for the network.
#[async_trait]
pub trait DocumentProbe: Send + Sync {
    async fn snapshot(&self) -> Result<String>;
}

/// Owns the HTTP client and knows how the registry's URLs are shaped.
/// This is the page-navigation collaborator; the extraction core only ever
/// sees the markup it returns.
pub struct PageFetcher {
    client: Client,
    base_url: String,
    report_year: u16,
}

impl PageFetcher {
    pub fn new(config: &ScrapingConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            report_year: config.report_year,
        })
    }

    /// Search listing URL for a company-name query, year-scoped and ordered by
    /// registry id so the first data row is the lowest id.
    pub fn search_url(&self, company_name: &str) -> Result<String> {
        let year = self.report_year.to_string();
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("fromYear", year.as_str()),
                ("toYear", year.as_str()),
                ("name", company_name),
                ("direction", "ascending"),
                ("order", "NPRI_Id"),
                ("length", "10"),
                ("page", "1"),
            ],
        )?;
        Ok(url.to_string())
    }

    /// Facility detail page URL for one registry id.
    pub fn facility_url(&self, registry_id: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url, self.report_year, registry_id
        )
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()).into());
        }

        let markup = response.text().await?;
        debug!("Fetched {} bytes from {}", markup.len(), url);

        Ok(markup)
    }

    /// A probe bound to one URL; each snapshot is a fresh fetch of it.
    pub fn probe<'a>(&'a self, url: &'a str) -> PageProbe<'a> {
        PageProbe { fetcher: self, url }
    }
}

pub struct PageProbe<'a> {
    fetcher: &'a PageFetcher,
    url: &'a str,
}

#[async_trait]
impl DocumentProbe for PageProbe<'_> {
    async fn snapshot(&self) -> Result<String> {
        self.fetcher.fetch(self.url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn fetcher() -> PageFetcher {
        PageFetcher::new(&Config::default().scraping).unwrap()
    }

    #[test]
    fn search_url_encodes_company_name() {
        let url = fetcher().search_url("Pine Cliff Energy Ltd.").unwrap();
        assert!(url.contains("name=Pine+Cliff+Energy+Ltd.") || url.contains("name=Pine%20Cliff%20Energy%20Ltd."));
        assert!(url.contains("fromYear=2024"));
        assert!(url.contains("order=NPRI_Id"));
    }

    #[test]
    fn facility_url_is_year_scoped() {
        let url = fetcher().facility_url("1368");
        assert!(url.ends_with("/2024/1368"));
    }
}

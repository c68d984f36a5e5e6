use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub scraping: ScrapingConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapingConfig {
    pub base_url: String,
    pub report_year: u16,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Maximum time to wait for dynamically rendered content before giving up
    /// and extracting whatever is there.
    pub wait_budget_secs: u64,
    pub poll_interval_ms: u64,
    /// Trailing wait after content is detected (or the budget runs out), so
    /// sibling fields rendered asynchronously have a chance to appear.
    pub settle_delay_secs: u64,
    pub delay_between_companies_ms: u64,
    pub companies_file: String,
    /// Optional YAML table of verified literal field values per registry id,
    /// consulted as the highest-precedence cascade strategy when present.
    pub overrides_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub directory: String,
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scraping: ScrapingConfig {
                base_url: "https://pollution-waste.canada.ca/national-release-inventory/"
                    .to_string(),
                report_year: 2024,
                user_agent: "Mozilla/5.0 (compatible; NpriScraper/1.0)".to_string(),
                request_timeout_secs: 30,
                wait_budget_secs: 30,
                poll_interval_ms: 5000,
                settle_delay_secs: 10,
                delay_between_companies_ms: 5000,
                companies_file: "companies.txt".to_string(),
                overrides_file: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            output: OutputConfig {
                directory: "out".to_string(),
                pretty_json: true,
            },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
scraping:
  base_url: "https://example.test/inventory/"
  report_year: 2024
  user_agent: "test-agent"
  request_timeout_secs: 10
  wait_budget_secs: 5
  poll_interval_ms: 500
  settle_delay_secs: 1
  delay_between_companies_ms: 100
  companies_file: "companies.txt"
  overrides_file: "overrides.yml"
logging:
  level: "debug"
output:
  directory: "out"
  pretty_json: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scraping.report_year, 2024);
        assert_eq!(config.scraping.overrides_file.as_deref(), Some("overrides.yml"));
        assert!(!config.output.pretty_json);
    }

    #[test]
    fn default_points_at_npri() {
        let config = Config::default();
        assert!(config.scraping.base_url.contains("national-release-inventory"));
        assert!(config.scraping.overrides_file.is_none());
    }
}

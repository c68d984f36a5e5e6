use std::collections::BTreeSet;
use std::io::Write;

use chrono::Utc;
use tracing::info;

use crate::models::{CompanyRecord, Result};

/// Writes the aggregate JSON report and its flattened CSV form. The CSV
/// column set is the union of field keys observed across all records, sorted,
/// with missing values as empty strings.
pub struct ReportWriter {
    directory: String,
    pretty_json: bool,
}

impl ReportWriter {
    pub fn new(directory: &str, pretty_json: bool) -> Self {
        Self {
            directory: directory.to_string(),
            pretty_json,
        }
    }

    pub async fn write(&self, records: &[CompanyRecord]) -> Result<(String, String)> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let json_path = format!("{}/contact_report_{}.json", self.directory, timestamp);
        let csv_path = format!("{}/contact_report_{}.csv", self.directory, timestamp);

        let json = if self.pretty_json {
            serde_json::to_string_pretty(records)?
        } else {
            serde_json::to_string(records)?
        };
        tokio::fs::write(&json_path, json).await?;

        let mut file = std::fs::File::create(&csv_path)?;
        write!(file, "{}", self.render_csv(records))?;

        info!("Report written: {} and {}", json_path, csv_path);
        Ok((json_path, csv_path))
    }

    pub fn render_csv(&self, records: &[CompanyRecord]) -> String {
        let field_columns: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.fields.keys().copied())
            .collect();

        let mut out = String::new();
        out.push_str("company_name,registry_id,outcome,success");
        for column in &field_columns {
            out.push(',');
            out.push_str(column);
        }
        out.push('\n');

        for record in records {
            out.push_str(&csv_escape(&record.company_name));
            out.push(',');
            out.push_str(record.registry_id.as_deref().unwrap_or(""));
            out.push(',');
            out.push_str(&record.outcome);
            out.push(',');
            out.push_str(if record.success { "true" } else { "false" });
            for column in &field_columns {
                out.push(',');
                if let Some(value) = record.fields.get(column) {
                    out.push_str(&csv_escape(value));
                }
            }
            out.push('\n');
        }

        out
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

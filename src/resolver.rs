use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::Serialize;
use tracing::debug;

use crate::models::RawDocument;

/// Result of resolving a registry id from a search listing.
///
/// `Candidates` is the last-resort text scan: bounded all-digit tokens found
/// anywhere in the page, surfaced for manual disambiguation and never
/// auto-selected as an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverOutcome {
    Found(String),
    Candidates(Vec<String>),
    Exhausted,
}

/// Resolves at most one numeric registry identifier from a company-name
/// search listing.
///
/// Walks these stages, first match wins:
/// 1. locate a results table whose header mentions a registry/NPRI token and
///    an id token (any order, any case);
/// 2. keep only rows containing a >3-character keyword from the company name,
///    guarding against false matches in an alphabetically broader listing;
/// 3. in such a row, prefer a year-scoped detail link with purely numeric
///    text, then the id column's own numeric text;
/// 4. failing that, scan every link in the table for the year-scoped pattern,
///    company filter dropped;
/// 5. failing the DOM approach entirely, scan the plain text for 4-5 digit
///    tokens and return them as candidates.
pub struct IdentifierResolver {
    year_path: String,
    year_href_re: Regex,
    candidate_re: Regex,
    tag_re: Regex,
    table_selector: Selector,
    row_selector: Selector,
    cell_selector: Selector,
    link_selector: Selector,
}

impl IdentifierResolver {
    pub fn new(report_year: u16) -> Self {
        Self {
            year_path: format!("/{}/", report_year),
            year_href_re: Regex::new(&format!(r"/{}/(\d+)", report_year)).unwrap(),
            candidate_re: Regex::new(r"\b\d{4,5}\b").unwrap(),
            tag_re: Regex::new(r"<[^>]+>").unwrap(),
            table_selector: Selector::parse("table").unwrap(),
            row_selector: Selector::parse("tr").unwrap(),
            cell_selector: Selector::parse("th, td").unwrap(),
            link_selector: Selector::parse("a[href]").unwrap(),
        }
    }

    pub fn resolve(&self, doc: &RawDocument, company_name: &str) -> ResolverOutcome {
        if let Some(dom) = doc.dom() {
            for table in dom.select(&self.table_selector) {
                let Some(id_column) = self.identifier_column(&table) else {
                    continue;
                };
                debug!("Results table located, id column at index {}", id_column);

                if let Some(id) = self.scan_matching_rows(&table, company_name, id_column) {
                    return ResolverOutcome::Found(id);
                }

                // Step 4: company filter dropped, links only. Lower confidence
                // but still anchored on the year-scoped detail path.
                if let Some(id) = self.scan_table_links(&table) {
                    debug!("Identifier found via table-wide link scan");
                    return ResolverOutcome::Found(id);
                }
            }
            debug!("No identifier via table approach, falling back to text scan");
        } else {
            debug!("No DOM available, falling back to text scan");
        }

        self.text_fallback(doc)
    }

    /// Index of the id column, if this table's header row names both a
    /// registry token and an id token (in one cell or across cells).
    fn identifier_column(&self, table: &ElementRef<'_>) -> Option<usize> {
        let header = table.select(&self.row_selector).next()?;
        let cells: Vec<String> = header
            .select(&self.cell_selector)
            .map(|c| c.text().collect::<String>().to_lowercase())
            .collect();

        let has_registry = cells
            .iter()
            .any(|c| c.contains("npri") || c.contains("registry"));
        let has_id = cells.iter().any(|c| c.contains("id"));
        if !has_registry || !has_id {
            return None;
        }

        cells
            .iter()
            .position(|c| (c.contains("npri") || c.contains("registry")) && c.contains("id"))
            .or_else(|| cells.iter().position(|c| c.contains("id")))
    }

    fn scan_matching_rows(
        &self,
        table: &ElementRef<'_>,
        company_name: &str,
        id_column: usize,
    ) -> Option<String> {
        let keywords: Vec<String> = company_name
            .replace('.', "")
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .map(|w| w.to_lowercase())
            .collect();
        if keywords.is_empty() {
            return None;
        }

        for row in table.select(&self.row_selector).skip(1) {
            let row_text = row.text().collect::<String>().to_lowercase();
            if !keywords.iter().any(|k| row_text.contains(k.as_str())) {
                continue;
            }
            debug!("Row matches company keyword, checking for identifier");

            for link in row.select(&self.link_selector) {
                let href = link.value().attr("href").unwrap_or_default();
                let text = link.text().collect::<String>().trim().to_string();

                if href.contains(&self.year_path) && is_numeric(&text) {
                    return Some(text);
                }
                if let Some(captures) = self.year_href_re.captures(href) {
                    return Some(captures[1].to_string());
                }
                // A bare numeric link in a matching row is still a plausible
                // detail link even without the year path.
                if is_numeric(&text) && text.len() >= 3 {
                    return Some(text);
                }
            }

            let cells: Vec<String> = row
                .select(&self.cell_selector)
                .map(|c| c.text().collect::<String>().trim().to_string())
                .collect();
            if let Some(cell) = cells.get(id_column) {
                if is_numeric(cell) {
                    return Some(cell.clone());
                }
            }
        }

        None
    }

    fn scan_table_links(&self, table: &ElementRef<'_>) -> Option<String> {
        for link in table.select(&self.link_selector) {
            let href = link.value().attr("href").unwrap_or_default();
            let text = link.text().collect::<String>().trim().to_string();

            if href.contains(&self.year_path) && is_numeric(&text) {
                return Some(text);
            }
            if let Some(captures) = self.year_href_re.captures(href) {
                return Some(captures[1].to_string());
            }
        }
        None
    }

    /// Bounded-length all-digit tokens from the visible text, deduplicated in
    /// order of appearance and capped. A candidate list, not an answer.
    fn text_fallback(&self, doc: &RawDocument) -> ResolverOutcome {
        let text = self.tag_re.replace_all(doc.markup(), " ");

        let mut candidates: Vec<String> = Vec::new();
        for token in self.candidate_re.find_iter(&text) {
            let token = token.as_str().to_string();
            if !candidates.contains(&token) {
                candidates.push(token);
            }
            if candidates.len() >= 10 {
                break;
            }
        }

        if candidates.is_empty() {
            ResolverOutcome::Exhausted
        } else {
            ResolverOutcome::Candidates(candidates)
        }
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

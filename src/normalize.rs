use regex::Regex;

use crate::models::FieldKey;

/// Cleans raw matched values and rejects anything that fails its field's shape
/// check. Rejection is silent: a dropped field and an absent field look the
/// same to everything downstream of this boundary.
pub struct FieldNormalizer {
    tag_re: Regex,
    brace_re: Regex,
    email_re: Regex,
}

impl FieldNormalizer {
    pub fn new() -> Self {
        Self {
            tag_re: Regex::new(r"<[^>]+>").unwrap(),
            // Unresolved client-side template placeholders, e.g. {{ facility.name }}.
            brace_re: Regex::new(r"\{\{[^}]*\}\}").unwrap(),
            email_re: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap(),
        }
    }

    /// Returns the cleaned value, or None when the value is invalid for the
    /// key. Never errors.
    pub fn normalize(&self, key: FieldKey, raw: &str) -> Option<String> {
        let stripped = self.tag_re.replace_all(raw, " ");
        let stripped = self.brace_re.replace_all(&stripped, " ");
        let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

        if cleaned.is_empty() {
            return None;
        }

        match key {
            FieldKey::Email => self.email_re.is_match(&cleaned).then_some(cleaned),
            FieldKey::Phone => {
                let phone: String = cleaned
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '(' || *c == ')')
                    .collect();
                let digits = phone.chars().filter(char::is_ascii_digit).count();
                (digits >= 7).then_some(phone)
            }
            // Canadian business numbers are nine digits, exactly.
            FieldKey::BusinessNumber => {
                (cleaned.len() == 9 && cleaned.chars().all(|c| c.is_ascii_digit()))
                    .then_some(cleaned)
            }
            FieldKey::EmployeeCount | FieldKey::RegistryId => cleaned
                .chars()
                .all(|c| c.is_ascii_digit())
                .then_some(cleaned),
            FieldKey::ContactName | FieldKey::Position | FieldKey::Language => Some(cleaned),
        }
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

use super::{candidate_from_text, flatten_markup, ScrapeError, Strategy};
use crate::models::PartialMatch;
use once_cell::sync::Lazy;
use regex::Regex;

static ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>.*?</tr>").unwrap());

/// Scans every table row of the page, flattening each to text
pub struct RowScanStrategy;

impl Strategy for RowScanStrategy {
    fn name(&self) -> &'static str {
        "row-scan"
    }

    fn extract_candidates(&self, markup: &str) -> Result<Vec<PartialMatch>, ScrapeError> {
        Ok(ROW_RE
            .find_iter(markup)
            .filter_map(|row| candidate_from_text(&flatten_markup(row.as_str())))
            .collect())
    }
}

pub mod css_scan;
pub mod embedded_json;
pub mod row_scan;

use crate::models::{MatchStatus, PartialMatch, RawOdds};
use crate::utils::odds::{is_plausible_odds, parse_decimal_odds};
use once_cell::sync::Lazy;
use regex::Regex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, warn};

pub use css_scan::CssScanStrategy;
pub use embedded_json::EmbeddedJsonStrategy;
pub use row_scan::RowScanStrategy;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").unwrap());
// Dash or `vs` separated pairs are preferred over colon separated ones
static DASH_TEAMS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\p{L}[\p{L}\s.'&]*?\p{L}\.?)\s*(?:[-–—]|\b(?i:vs)\b\.?)\s*(\p{L}[\p{L}\s.'&]*)")
        .unwrap()
});
static COLON_TEAMS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\p{L}[\p{L}\s.'&]*?\p{L}\.?)\s*:\s*(\p{L}[\p{L}\s.'&]*)").unwrap()
});
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)*").unwrap());
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}[.,]\d{1,3}$").unwrap());
static DOT_DECIMAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}$").unwrap());
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4,6}$").unwrap());
static LEAGUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:TUR|ESP|ENG|GER|ITA|FRA|POR|NED|BEL|SCO)\d?|UCL|UEL|UECL)\b").unwrap()
});
// Column headers that sometimes get swallowed into a team capture
static ODDS_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:oran|oranlar|odds)\b").unwrap());

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("embedded match data could not be parsed: {0}")]
    EmbeddedData(#[from] serde_json::Error),
    #[error("strategy panicked: {0}")]
    Panicked(String),
}

/// One independent heuristic turning page markup into match candidates
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fallible extraction. Callers should prefer `run`/`report`.
    fn extract_candidates(&self, markup: &str) -> Result<Vec<PartialMatch>, ScrapeError>;

    /// Run the strategy inside its error boundary, keeping the error for diagnostics
    fn report(&self, markup: &str) -> StrategyReport {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.extract_candidates(markup)))
            .unwrap_or_else(|panic| Err(ScrapeError::Panicked(panic_message(&*panic))));

        match outcome {
            Ok(candidates) => {
                debug!("{} produced {} candidates", self.name(), candidates.len());
                StrategyReport {
                    name: self.name(),
                    candidates,
                    error: None,
                }
            }
            Err(e) => {
                warn!("{} failed, contributing nothing: {}", self.name(), e);
                StrategyReport {
                    name: self.name(),
                    candidates: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Run the strategy; any failure yields an empty list
    fn run(&self, markup: &str) -> Vec<PartialMatch> {
        self.report(markup).candidates
    }
}

/// What a single strategy contributed to one extraction pass
#[derive(Debug, Clone)]
pub struct StrategyReport {
    pub name: &'static str,
    pub candidates: Vec<PartialMatch>,
    pub error: Option<String>,
}

/// Row scan, CSS scan, embedded JSON, in that order
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(RowScanStrategy),
        Box::new(CssScanStrategy::new()),
        Box::new(EmbeddedJsonStrategy),
    ]
}

/// Apply every strategy to the same markup, in order
pub fn run_strategies(strategies: &[Box<dyn Strategy>], markup: &str) -> Vec<StrategyReport> {
    strategies.iter().map(|s| s.report(markup)).collect()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Strip tags, decode common entities and collapse whitespace
pub fn flatten_markup(chunk: &str) -> String {
    let text = TAG_RE.replace_all(chunk, " ");
    let text = decode_entities(&text);
    WS_RE.replace_all(&text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&ndash;", "–")
        .replace("&mdash;", "—")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Team-name checks every strategy applies before accepting a candidate
pub fn valid_team_names(home: &str, away: &str) -> bool {
    let home = home.trim();
    let away = away.trim();

    let acceptable = |name: &str| {
        name.chars().count() >= 3
            && !name.chars().all(|c| c.is_ascii_digit())
            && !ODDS_LABEL_RE.is_match(name)
    };

    acceptable(home) && acceptable(away) && home != away
}

/// First `HH:MM` token in the text, zero-padded
pub fn find_time(text: &str) -> Option<String> {
    let caps = TIME_RE.captures(text)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    Some(format!("{:02}:{}", hour, caps.get(2)?.as_str()))
}

/// First home/away pair separated by a dash or `vs`, else by a colon
pub fn find_teams(text: &str) -> Option<(String, String)> {
    let caps = DASH_TEAMS_RE
        .captures(text)
        .or_else(|| COLON_TEAMS_RE.captures(text))?;
    let home = caps.get(1)?.as_str().trim().to_string();
    let away = caps.get(2)?.as_str().trim().to_string();
    Some((home, away))
}

/// A comma-joined run like `2.10,3.20,3.50` is split into its decimals.
/// Anything else (including `19.05.2024` or `2,10`) stays one token.
fn split_joined_odds(token: &str) -> Vec<&str> {
    let pieces: Vec<&str> = token.split(',').collect();
    if pieces.len() > 1 && pieces.iter().all(|p| DOT_DECIMAL_RE.is_match(p)) {
        pieces
    } else {
        vec![token]
    }
}

/// Decimal tokens in document order that look like odds (1.00 - 50.00)
pub fn find_odds_tokens(text: &str) -> Vec<String> {
    NUMBER_RE
        .find_iter(text)
        .flat_map(|m| split_joined_odds(m.as_str()))
        .filter(|token| DECIMAL_RE.is_match(token))
        .filter(|token| parse_decimal_odds(token).is_some_and(is_plausible_odds))
        .map(str::to_string)
        .collect()
}

fn find_match_code(text: &str) -> Option<String> {
    NUMBER_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|token| CODE_RE.is_match(token))
        .map(str::to_string)
}

fn find_league(text: &str) -> Option<String> {
    LEAGUE_RE.find(text).map(|m| m.as_str().to_string())
}

/// Shared candidate extraction over one flattened text chunk.
///
/// A chunk qualifies only with a time token, a valid team pair and at least
/// three plausible odds. The 4th and 5th odds, when both present, become the
/// over/under 2.5 pair.
pub fn candidate_from_text(text: &str) -> Option<PartialMatch> {
    let time = find_time(text)?;
    let (home, away) = find_teams(text)?;
    if !valid_team_names(&home, &away) {
        return None;
    }

    let odds = find_odds_tokens(text);
    if odds.len() < 3 {
        return None;
    }

    let mut candidate = PartialMatch::new(&time, &home, &away);
    candidate.odds = Some(RawOdds {
        home: odds[0].clone(),
        draw: odds[1].clone(),
        away: odds[2].clone(),
    });
    if odds.len() >= 5 {
        candidate.over_under = Some((odds[3].clone(), odds[4].clone()));
    }
    candidate.match_code = find_match_code(text);
    candidate.league = find_league(text);
    candidate.status = Some(MatchStatus::Upcoming);

    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exploding;

    impl Strategy for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        fn extract_candidates(&self, _markup: &str) -> Result<Vec<PartialMatch>, ScrapeError> {
            panic!("boom")
        }
    }

    struct Failing;

    impl Strategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn extract_candidates(&self, _markup: &str) -> Result<Vec<PartialMatch>, ScrapeError> {
            Err(ScrapeError::Selector("div[".to_string()))
        }
    }

    #[test]
    fn test_flatten_markup() {
        let text = flatten_markup("<td>19:30</td>\n<td>Galatasaray&nbsp;-&nbsp;Fenerbahçe</td>");
        assert_eq!(text, "19:30 Galatasaray - Fenerbahçe");
        assert_eq!(flatten_markup("<b>Brighton &amp; Hove</b>"), "Brighton & Hove");
    }

    #[test]
    fn test_candidate_from_text() {
        let c = candidate_from_text("19:30 Galatasaray - Fenerbahçe 2.10 3.20 3.50").unwrap();
        assert_eq!(c.time, "19:30");
        assert_eq!(c.home_team, "Galatasaray");
        assert_eq!(c.away_team, "Fenerbahçe");
        let odds = c.odds.unwrap();
        assert_eq!((odds.home.as_str(), odds.draw.as_str(), odds.away.as_str()), ("2.10", "3.20", "3.50"));
        assert!(c.over_under.is_none());
    }

    #[test]
    fn test_candidate_rejects_out_of_range_and_dates() {
        // 75.00 is not odds and the date is a single token, leaving only two odds
        assert!(candidate_from_text("19.05.2024 20:00 Arsenal vs Chelsea 1.90 75.00 3.40").is_none());
    }

    #[test]
    fn test_candidate_with_extras() {
        let c = candidate_from_text("12345 ENG1 9:05 Arsenal vs Chelsea 1,90 3,40 4,10 1.85 1.95").unwrap();
        assert_eq!(c.time, "09:05");
        assert_eq!(c.home_team, "Arsenal");
        assert_eq!(c.away_team, "Chelsea");
        assert_eq!(c.match_code.as_deref(), Some("12345"));
        assert_eq!(c.league.as_deref(), Some("ENG1"));
        assert_eq!(c.odds.unwrap().home, "1,90");
        assert_eq!(c.over_under, Some(("1.85".to_string(), "1.95".to_string())));
    }

    #[test]
    fn test_short_and_comma_joined_odds() {
        let c = candidate_from_text("18:00 Ajax - PSV 2.1 3.2 3.5").unwrap();
        let odds = c.odds.unwrap();
        assert_eq!((odds.home.as_str(), odds.draw.as_str(), odds.away.as_str()), ("2.1", "3.2", "3.5"));

        let c = candidate_from_text("18:00 Ajax - PSV 2.10,3.20,3.50").unwrap();
        assert_eq!(c.odds.unwrap().away, "3.50");

        assert_eq!(find_odds_tokens("1,85 19.05.2024 2.10,3.20"), vec!["1,85", "2.10", "3.20"]);
    }

    #[test]
    fn test_dash_pair_preferred_over_label_colon() {
        let c = candidate_from_text("Maç: Galatasaray - Fenerbahçe 19:30 2.10 3.20 3.50").unwrap();
        assert_eq!(c.home_team, "Galatasaray");
        assert_eq!(c.away_team, "Fenerbahçe");

        assert_eq!(
            find_teams("Roma : Lazio"),
            Some(("Roma".to_string(), "Lazio".to_string()))
        );
    }

    #[test]
    fn test_valid_team_names() {
        assert!(valid_team_names("Galatasaray", "Fenerbahçe"));
        assert!(!valid_team_names("AB", "Fenerbahçe"));
        assert!(!valid_team_names("Roma", "Roma"));
        assert!(!valid_team_names("12345", "Lazio"));
        assert!(!valid_team_names("Fenerbahçe Oran", "Galatasaray"));
        assert!(!valid_team_names("Lazio", "Odds"));
    }

    #[test]
    fn test_boundary_swallows_errors_and_panics() {
        assert!(Exploding.run("<tr>19:30 A - B</tr>").is_empty());
        let report = Failing.report("anything");
        assert!(report.candidates.is_empty());
        assert!(report.error.unwrap().contains("invalid selector"));
    }

    #[test]
    fn test_run_strategies_keeps_order() {
        let reports = run_strategies(&default_strategies(), "<html></html>");
        let names: Vec<_> = reports.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["row-scan", "css-scan", "embedded-json"]);
        assert!(reports.iter().all(|r| r.candidates.is_empty()));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Odds value used when a source does not provide a real price
pub const NO_ODDS: &str = "1.00";

/// League label for matches whose competition could not be recognized
pub const DEFAULT_LEAGUE: &str = "MISC";

/// Lifecycle state of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Upcoming,
    Live,
    Finished,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "upcoming" | "scheduled" | "not_started" => Some(MatchStatus::Upcoming),
            "live" | "inplay" | "in_play" | "canli" | "canlı" => Some(MatchStatus::Live),
            "finished" | "ended" | "ft" | "bitti" => Some(MatchStatus::Finished),
            _ => None,
        }
    }

    /// Only live and finished matches may carry a score
    pub fn has_score(&self) -> bool {
        !matches!(self, MatchStatus::Upcoming)
    }
}

/// 1X2 decimal odds, each formatted to two decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    pub home: String,
    pub draw: String,
    pub away: String,
}

impl Default for Odds {
    fn default() -> Self {
        Self {
            home: NO_ODDS.to_string(),
            draw: NO_ODDS.to_string(),
            away: NO_ODDS.to_string(),
        }
    }
}

/// Over/under 2.5 goals decimal odds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverUnder {
    #[serde(rename = "over25")]
    pub over25: String,
    #[serde(rename = "under25")]
    pub under25: String,
}

/// One scheduled or in-progress fixture, as served to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: u32,
    pub time: String,
    pub home_team: String,
    pub away_team: String,
    pub odds: Odds,
    pub league: String,
    pub match_code: String,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub over_under: Option<OverUnder>,
}

impl Match {
    /// Deduplication key: kickoff time plus both team names, trimmed
    pub fn key(&self) -> (String, String, String) {
        (
            self.time.trim().to_string(),
            self.home_team.trim().to_string(),
            self.away_team.trim().to_string(),
        )
    }
}

/// Raw odds strings as captured by a strategy, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawOdds {
    pub home: String,
    pub draw: String,
    pub away: String,
}

/// A best-effort candidate produced by one extraction strategy
#[derive(Debug, Clone, PartialEq)]
pub struct PartialMatch {
    pub time: String,
    pub home_team: String,
    pub away_team: String,
    pub odds: Option<RawOdds>,
    pub over_under: Option<(String, String)>,
    pub league: Option<String>,
    pub match_code: Option<String>,
    pub status: Option<MatchStatus>,
    pub score: Option<String>,
}

impl PartialMatch {
    pub fn new(time: &str, home_team: &str, away_team: &str) -> Self {
        Self {
            time: time.trim().to_string(),
            home_team: home_team.trim().to_string(),
            away_team: away_team.trim().to_string(),
            odds: None,
            over_under: None,
            league: None,
            match_code: None,
            status: None,
            score: None,
        }
    }
}

/// Body of `GET /api/matches`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesResponse {
    pub matches: Vec<Match>,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub total_matches: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// Troubleshooting details describing which path produced a response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub requested_date: Option<String>,
    pub resolved_date: String,
    pub date_was_valid: bool,
    pub parser: String,
    pub sample_data: bool,
    pub scraping_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_url: Option<String>,
    pub tried_urls: usize,
    pub fetch_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_page: Option<String>,
    pub strategy_counts: BTreeMap<String, usize>,
    pub strategy_errors: BTreeMap<String, String>,
    pub extracted_matches: usize,
}

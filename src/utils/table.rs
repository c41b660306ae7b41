use crate::models::{Match, MatchStatus};
use crate::utils::odds::{double_chance_str, parse_decimal_odds};
use serde::Deserialize;
use std::cmp::Ordering;

/// Filter and sort options for the match table, read from the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    pub date: Option<String>,
    pub league: Option<String>,
    pub status: Option<String>,
    /// Case-insensitive substring of either team
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// One rendered table row, with derived double chance columns
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRow {
    pub id: u32,
    pub time: String,
    pub league: String,
    pub status: String,
    pub home_team: String,
    pub away_team: String,
    pub score: String,
    pub code: String,
    pub odds1: String,
    pub odds_x: String,
    pub odds2: String,
    pub over25: String,
    pub under25: String,
    pub dc_1x: String,
    pub dc_12: String,
    pub dc_x2: String,
}

impl From<&Match> for MatchRow {
    fn from(m: &Match) -> Self {
        let (over25, under25) = m
            .over_under
            .as_ref()
            .map(|ou| (ou.over25.clone(), ou.under25.clone()))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));

        Self {
            id: m.id,
            time: m.time.clone(),
            league: m.league.clone(),
            status: m.status.as_str().to_string(),
            home_team: m.home_team.clone(),
            away_team: m.away_team.clone(),
            score: m.score.clone().unwrap_or_default(),
            code: m.match_code.clone(),
            odds1: m.odds.home.clone(),
            odds_x: m.odds.draw.clone(),
            odds2: m.odds.away.clone(),
            over25,
            under25,
            dc_1x: double_chance_str(&m.odds.home, &m.odds.draw),
            dc_12: double_chance_str(&m.odds.home, &m.odds.away),
            dc_x2: double_chance_str(&m.odds.draw, &m.odds.away),
        }
    }
}

impl TableQuery {
    fn keeps(&self, m: &Match) -> bool {
        if let Some(league) = self.league.as_deref().filter(|l| !l.is_empty()) {
            if !m.league.eq_ignore_ascii_case(league) {
                return false;
            }
        }

        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            if MatchStatus::parse(status) != Some(m.status) {
                return false;
            }
        }

        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = q.to_lowercase();
            if !m.home_team.to_lowercase().contains(&q) && !m.away_team.to_lowercase().contains(&q) {
                return false;
            }
        }

        true
    }

    fn descending(&self) -> bool {
        self.order
            .as_deref()
            .is_some_and(|o| o.eq_ignore_ascii_case("desc"))
    }

    /// Filter the matches and sort the resulting rows
    pub fn apply(&self, matches: &[Match]) -> Vec<MatchRow> {
        let mut rows: Vec<MatchRow> = matches
            .iter()
            .filter(|m| self.keeps(m))
            .map(MatchRow::from)
            .collect();

        if let Some(column) = self.sort.as_deref() {
            rows.sort_by(|a, b| compare_rows(a, b, column));
            if self.descending() {
                rows.reverse();
            }
        }

        rows
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = parse_decimal_odds(a).unwrap_or(0.0);
    let b = parse_decimal_odds(b).unwrap_or(0.0);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn compare_rows(a: &MatchRow, b: &MatchRow, column: &str) -> Ordering {
    match column {
        "time" => a.time.cmp(&b.time),
        "league" => a.league.cmp(&b.league),
        "home" => a.home_team.to_lowercase().cmp(&b.home_team.to_lowercase()),
        "away" => a.away_team.to_lowercase().cmp(&b.away_team.to_lowercase()),
        "odds1" => compare_numeric(&a.odds1, &b.odds1),
        "oddsX" | "oddsx" => compare_numeric(&a.odds_x, &b.odds_x),
        "odds2" => compare_numeric(&a.odds2, &b.odds2),
        "over" => compare_numeric(&a.over25, &b.over25),
        "under" => compare_numeric(&a.under25, &b.under25),
        "dc1x" => compare_numeric(&a.dc_1x, &b.dc_1x),
        "dc12" => compare_numeric(&a.dc_12, &b.dc_12),
        "dcx2" => compare_numeric(&a.dc_x2, &b.dc_x2),
        _ => a.id.cmp(&b.id),
    }
}

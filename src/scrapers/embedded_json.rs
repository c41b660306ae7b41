use super::{find_time, valid_team_names, ScrapeError, Strategy};
use crate::models::{MatchStatus, PartialMatch, RawOdds, NO_ODDS};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Assignments that have carried inline fixture arrays, tried in order
static ASSIGNMENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bvar\s+matches\s*=\s*\[",
        r"\bwindow\.matchData\s*=\s*\[",
        r#""matches"\s*:\s*\["#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// A JSON scalar that may arrive as either a string or a number
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddedOdds {
    #[serde(alias = "1")]
    home: Option<Scalar>,
    #[serde(alias = "x", alias = "X")]
    draw: Option<Scalar>,
    #[serde(alias = "2")]
    away: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedOverUnder {
    #[serde(alias = "over")]
    over25: Option<Scalar>,
    #[serde(alias = "under")]
    under25: Option<Scalar>,
}

/// One element of an inline fixture array, tolerating the known field aliases
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedMatch {
    time: Option<String>,
    #[serde(alias = "home")]
    home_team: Option<String>,
    #[serde(alias = "away")]
    away_team: Option<String>,
    odds: Option<EmbeddedOdds>,
    league: Option<String>,
    #[serde(alias = "code")]
    match_code: Option<Scalar>,
    id: Option<Scalar>,
    status: Option<String>,
    score: Option<String>,
    over_under: Option<EmbeddedOverUnder>,
}

impl EmbeddedMatch {
    fn into_partial(self) -> Option<PartialMatch> {
        let home = self.home_team?;
        let away = self.away_team?;
        if !valid_team_names(&home, &away) {
            return None;
        }

        let time = self
            .time
            .as_deref()
            .and_then(find_time)
            .unwrap_or_else(|| "00:00".to_string());

        let mut candidate = PartialMatch::new(&time, &home, &away);
        candidate.odds = self.odds.map(|o| RawOdds {
            home: o.home.map_or_else(|| NO_ODDS.to_string(), Scalar::into_string),
            draw: o.draw.map_or_else(|| NO_ODDS.to_string(), Scalar::into_string),
            away: o.away.map_or_else(|| NO_ODDS.to_string(), Scalar::into_string),
        });
        candidate.over_under = self.over_under.and_then(|ou| {
            Some((ou.over25?.into_string(), ou.under25?.into_string()))
        });
        candidate.league = self.league.filter(|l| !l.trim().is_empty());
        candidate.match_code = self.match_code.or(self.id).map(Scalar::into_string);
        candidate.status = self.status.as_deref().and_then(MatchStatus::parse);
        candidate.score = self.score.filter(|s| !s.trim().is_empty());

        Some(candidate)
    }
}

/// Reads fixture arrays assigned inside `<script>` bodies
pub struct EmbeddedJsonStrategy;

impl Strategy for EmbeddedJsonStrategy {
    fn name(&self) -> &'static str {
        "embedded-json"
    }

    fn extract_candidates(&self, markup: &str) -> Result<Vec<PartialMatch>, ScrapeError> {
        let selector =
            Selector::parse("script").map_err(|e| ScrapeError::Selector(e.to_string()))?;
        let document = Html::parse_document(markup);

        let mut candidates = Vec::new();
        let mut parsed_any = false;
        let mut last_error = None;

        for script in document.select(&selector) {
            let body = script.text().collect::<String>();

            for pattern in ASSIGNMENT_PATTERNS.iter() {
                let Some(found) = pattern.find(&body) else {
                    continue;
                };
                // The pattern ends on the opening bracket
                let Some(span) = bracket_span(&body, found.end() - 1) else {
                    debug!("unterminated array after {:?}", found.as_str());
                    continue;
                };

                match serde_json::from_str::<Vec<Value>>(span) {
                    Ok(items) => {
                        parsed_any = true;
                        candidates.extend(
                            items
                                .into_iter()
                                .filter_map(|item| serde_json::from_value::<EmbeddedMatch>(item).ok())
                                .filter_map(EmbeddedMatch::into_partial),
                        );
                        break;
                    }
                    Err(e) => last_error = Some(e),
                }
            }
        }

        match last_error {
            Some(e) if !parsed_any => Err(ScrapeError::EmbeddedData(e)),
            _ => Ok(candidates),
        }
    }
}

/// The balanced `[...]` span starting at `start`, skipping brackets inside strings
fn bracket_span(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

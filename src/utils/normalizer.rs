use crate::models::{Match, Odds, OverUnder, PartialMatch, DEFAULT_LEAGUE};
use crate::utils::odds::{format_odds, normalize_odds, parse_decimal_odds};
use std::collections::HashSet;

/// Offset for match codes synthesized when the source gave none
const SYNTHETIC_CODE_BASE: usize = 10000;

/// Turn the concatenated strategy output into the final, id-stamped list
pub fn normalize(candidates: Vec<PartialMatch>) -> Vec<Match> {
    let matches = candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| canonicalize(candidate, index))
        .collect();

    dedup(matches)
}

/// Map one candidate onto the canonical shape. `index` is its position in
/// the concatenated strategy output and only feeds the placeholder code.
pub fn canonicalize(candidate: PartialMatch, index: usize) -> Match {
    let odds = candidate
        .odds
        .map(|raw| Odds {
            home: normalize_odds(&raw.home),
            draw: normalize_odds(&raw.draw),
            away: normalize_odds(&raw.away),
        })
        .unwrap_or_default();

    let over_under = candidate.over_under.and_then(|(over, under)| {
        let over = parse_decimal_odds(&over).filter(|v| *v >= 1.0)?;
        let under = parse_decimal_odds(&under).filter(|v| *v >= 1.0)?;
        Some(OverUnder {
            over25: format_odds(over),
            under25: format_odds(under),
        })
    });

    let status = candidate.status.unwrap_or_default();
    let score = if status.has_score() {
        candidate.score.as_deref().and_then(normalize_score)
    } else {
        None
    };

    Match {
        id: 0,
        time: candidate.time.trim().to_string(),
        home_team: candidate.home_team.trim().to_string(),
        away_team: candidate.away_team.trim().to_string(),
        odds,
        league: candidate
            .league
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LEAGUE.to_string()),
        match_code: candidate
            .match_code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| (SYNTHETIC_CODE_BASE + index).to_string()),
        status,
        score,
        over_under,
    }
}

/// Drop later records sharing (time, home, away) and renumber ids from 1.
/// Applying it to its own output changes nothing.
pub fn dedup(matches: Vec<Match>) -> Vec<Match> {
    let mut seen = HashSet::new();

    matches
        .into_iter()
        .filter(|m| seen.insert(m.key()))
        .enumerate()
        .map(|(index, mut m)| {
            m.id = index as u32 + 1;
            m
        })
        .collect()
}

/// `"2 - 1"` -> `"2-1"`; anything that is not two integers is dropped
fn normalize_score(raw: &str) -> Option<String> {
    let (home, away) = raw.split_once(['-', ':'])?;
    let home: u32 = home.trim().parse().ok()?;
    let away: u32 = away.trim().parse().ok()?;
    Some(format!("{}-{}", home, away))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStatus, RawOdds};

    fn candidate(time: &str, home: &str, away: &str) -> PartialMatch {
        let mut c = PartialMatch::new(time, home, away);
        c.odds = Some(RawOdds {
            home: "2,10".to_string(),
            draw: "3.2".to_string(),
            away: "3.50".to_string(),
        });
        c
    }

    #[test]
    fn test_canonicalize_defaults() {
        let m = canonicalize(PartialMatch::new("19:30", " Roma ", "Lazio"), 3);

        assert_eq!(m.home_team, "Roma");
        assert_eq!(m.odds, Odds::default());
        assert_eq!(m.league, "MISC");
        assert_eq!(m.match_code, "10003");
        assert_eq!(m.status, MatchStatus::Upcoming);
        assert!(m.score.is_none());
    }

    #[test]
    fn test_canonicalize_odds_and_over_under() {
        let mut c = candidate("19:30", "Roma", "Lazio");
        c.over_under = Some(("1,85".to_string(), "1.9".to_string()));
        let m = canonicalize(c, 0);

        assert_eq!(m.odds.home, "2.10");
        assert_eq!(m.odds.draw, "3.20");
        assert_eq!(m.odds.away, "3.50");
        let ou = m.over_under.unwrap();
        assert_eq!((ou.over25.as_str(), ou.under25.as_str()), ("1.85", "1.90"));

        let mut bad = candidate("19:30", "Roma", "Lazio");
        bad.over_under = Some(("n/a".to_string(), "1.90".to_string()));
        assert!(canonicalize(bad, 0).over_under.is_none());
    }

    #[test]
    fn test_score_only_for_live_or_finished() {
        let mut live = candidate("19:30", "Ajax", "PSV");
        live.status = Some(MatchStatus::Live);
        live.score = Some("2 : 1".to_string());
        assert_eq!(canonicalize(live, 0).score.as_deref(), Some("2-1"));

        let mut upcoming = candidate("19:30", "Ajax", "PSV");
        upcoming.score = Some("0-0".to_string());
        assert!(canonicalize(upcoming, 0).score.is_none());
    }

    #[test]
    fn test_first_occurrence_wins_and_ids_are_sequential() {
        let mut first = candidate("19:30", "Galatasaray", "Fenerbahçe");
        first.league = Some("TUR1".to_string());
        let mut duplicate = candidate("19:30", "Galatasaray ", " Fenerbahçe");
        duplicate.league = Some("SUPER".to_string());
        let other = candidate("21:00", "Ajax", "PSV");

        let matches = normalize(vec![first, duplicate, other]);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].league, "TUR1");
        assert_eq!(matches[0].id, 1);
        assert_eq!(matches[1].home_team, "Ajax");
        assert_eq!(matches[1].id, 2);
        assert_eq!(matches[1].match_code, "10002");
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let matches = normalize(vec![
            candidate("19:30", "Galatasaray", "Fenerbahçe"),
            candidate("19:30", "Galatasaray", "Fenerbahçe"),
            candidate("19:30", "Fenerbahçe", "Galatasaray"),
            candidate("20:00", "Galatasaray", "Fenerbahçe"),
        ]);
        let again = dedup(matches.clone());

        assert_eq!(matches.len(), 3);
        assert_eq!(again, matches);
    }

    #[test]
    fn test_keys_unique() {
        let matches = normalize(vec![
            candidate("19:30", "Roma", "Lazio"),
            candidate("19:30", "Roma", "Lazio"),
            candidate("19:30", "Lazio", "Roma"),
        ]);
        let keys: HashSet<_> = matches.iter().map(Match::key).collect();
        assert_eq!(keys.len(), matches.len());
    }
}

use super::{candidate_from_text, flatten_markup, ScrapeError, Strategy};
use crate::models::PartialMatch;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Class/id fragments the source site has used for fixture blocks
const DEFAULT_KEYWORDS: [&str; 3] = ["match", "bet", "program"];

/// Selects elements by class/id naming conventions and extracts from their text
pub struct CssScanStrategy {
    keywords: Vec<String>,
}

impl CssScanStrategy {
    pub fn new() -> Self {
        Self::with_keywords(&DEFAULT_KEYWORDS)
    }

    pub fn with_keywords(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn selector(&self) -> Result<Selector, ScrapeError> {
        let css = self
            .keywords
            .iter()
            .flat_map(|k| [format!("[class*=\"{k}\"]"), format!("[id*=\"{k}\"]")])
            .collect::<Vec<_>>()
            .join(", ");

        Selector::parse(&css).map_err(|e| ScrapeError::Selector(e.to_string()))
    }
}

impl Default for CssScanStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for CssScanStrategy {
    fn name(&self) -> &'static str {
        "css-scan"
    }

    fn extract_candidates(&self, markup: &str) -> Result<Vec<PartialMatch>, ScrapeError> {
        if self.keywords.is_empty() {
            return Ok(Vec::new());
        }

        let selector = self.selector()?;
        let document = Html::parse_document(markup);
        let found: Vec<_> = document
            .select(&selector)
            .map(|element| {
                let text = element.text().collect::<Vec<_>>().join(" ");
                (element, candidate_from_text(&flatten_markup(&text)))
            })
            .collect();

        let productive: HashSet<_> = found
            .iter()
            .filter(|(_, candidate)| candidate.is_some())
            .map(|(element, _)| element.id())
            .collect();

        let mut candidates = Vec::new();
        for (element, candidate) in found {
            let Some(candidate) = candidate else {
                continue;
            };
            // A container whose inner blocks are fixtures themselves would merge them
            let has_productive_descendant = element
                .descendants()
                .skip(1)
                .any(|node| productive.contains(&node.id()));
            if !has_productive_descendant {
                candidates.push(candidate);
            }
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIV_LAYOUT: &str = r#"
        <html><body>
        <div id="betProgram">
          <div class="match-row">
            <span class="time">20:00</span>
            <span class="teams">Barcelona - Real Madrid</span>
            <span class="odd">2.45</span><span class="odd">3.40</span><span class="odd">2.75</span>
            <span class="code">4821</span>
          </div>
          <div class="match-row">
            <span class="time">22:00</span>
            <span class="teams">PSG - Marseille</span>
            <span class="odd">1.55</span><span class="odd">4.10</span><span class="odd">5.60</span>
          </div>
        </div>
        </body></html>"#;

    #[test]
    fn test_innermost_blocks() {
        let candidates = CssScanStrategy::new().run(DIV_LAYOUT);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].time, "20:00");
        assert_eq!(candidates[0].home_team, "Barcelona");
        assert_eq!(candidates[0].away_team, "Real Madrid");
        assert_eq!(candidates[0].match_code.as_deref(), Some("4821"));
        assert_eq!(candidates[1].home_team, "PSG");
        assert_eq!(candidates[1].odds.as_ref().unwrap().away, "5.60");
    }

    #[test]
    fn test_row_with_keyword_odds_cells() {
        let markup = r#"
            <div class="match-row">20:00 Barcelona - Real Madrid
              <span class="bet-odd">2.45</span><span class="bet-odd">3.40</span><span class="bet-odd">2.75</span>
            </div>"#;
        let candidates = CssScanStrategy::new().run(markup);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].home_team, "Barcelona");
        assert_eq!(candidates[0].away_team, "Real Madrid");
        assert_eq!(candidates[0].odds.as_ref().unwrap().draw, "3.40");
    }

    #[test]
    fn test_no_conventions_yields_nothing() {
        let markup = "<table><tr><td>19:30 Galatasaray - Fenerbahçe 2.10 3.20 3.50</td></tr></table>";
        assert!(CssScanStrategy::new().run(markup).is_empty());
    }

    #[test]
    fn test_custom_keywords() {
        let markup = r#"<li class="fixture">19:30 Roma - Lazio 2.30 3.10 3.05</li>"#;
        assert!(CssScanStrategy::new().run(markup).is_empty());

        let candidates = CssScanStrategy::with_keywords(&["fixture"]).run(markup);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].away_team, "Lazio");
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let markup = r#"<div class="match"><span>19:30 Roma - </div></span><div class="bet"#;
        assert!(CssScanStrategy::new().run(markup).is_empty());
    }
}

pub mod api;
pub mod config;
pub mod models;
pub mod scrapers;
pub mod utils;

pub use api::*;
pub use config::{AppConfig, ConfigError};
pub use models::*;
pub use scrapers::*;

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::{info, warn};
use utils::dates::{format_site_date, resolve_date, ResolvedDate};
use utils::fallback::generate_for_date;
use utils::normalizer::normalize;

/// Placeholder in configured URLs replaced with the requested `DD.MM.YYYY` date
pub const DATE_PLACEHOLDER: &str = "{date}";

pub const SCRAPED_PARSER: &str = "enhanced-html-parser";
pub const FALLBACK_PARSER: &str = "fallback-generator";
pub const FALLBACK_SOURCE: &str = "fallback";

/// Result of running every strategy over one page
#[derive(Debug, Clone)]
pub struct Extraction {
    pub matches: Vec<Match>,
    pub reports: Vec<StrategyReport>,
}

/// How a scrape attempt ended
#[derive(Debug, Clone)]
pub enum ScrapeOutcome {
    /// A page was fetched and yielded at least one match
    Scraped { url: String, extraction: Extraction },
    /// A page was fetched but no strategy found anything on it
    EmptyPage { url: String, extraction: Extraction },
    /// No candidate URL produced a usable page
    FetchFailed,
}

/// A scrape attempt plus the bookkeeping the debug block reports
#[derive(Debug, Clone)]
pub struct ScrapeRun {
    pub outcome: ScrapeOutcome,
    pub tried_urls: usize,
    pub fetch_errors: Vec<String>,
}

/// Fetch, extract, normalize and fall back
pub struct MatchPipeline<S = SiteFetcher> {
    source: S,
    strategies: Vec<Box<dyn Strategy>>,
    urls: Vec<String>,
    fallback_seed: Option<u64>,
}

impl MatchPipeline<SiteFetcher> {
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let fetcher = SiteFetcher::from_config(config)?;
        Ok(Self::new(fetcher, config.source_urls.clone()).with_fallback_seed(config.fallback_seed))
    }
}

impl<S: PageSource> MatchPipeline<S> {
    pub fn new(source: S, urls: Vec<String>) -> Self {
        Self {
            source,
            strategies: default_strategies(),
            urls,
            fallback_seed: None,
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn Strategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_fallback_seed(mut self, seed: Option<u64>) -> Self {
        self.fallback_seed = seed;
        self
    }

    /// Configured URLs with the date placeholder filled in
    pub fn candidate_urls(&self, date: NaiveDate) -> Vec<String> {
        let site_date = format_site_date(date);
        self.urls
            .iter()
            .map(|url| url.replace(DATE_PLACEHOLDER, &site_date))
            .collect()
    }

    /// Run every strategy over one page and normalize the combined candidates
    pub fn process_markup(&self, markup: &str) -> Extraction {
        let reports = run_strategies(&self.strategies, markup);
        let candidates = reports
            .iter()
            .flat_map(|r| r.candidates.iter().cloned())
            .collect();

        Extraction {
            matches: normalize(candidates),
            reports,
        }
    }

    /// Try the candidate URLs in order, stopping at the first usable page
    pub async fn scrape(&self, date: NaiveDate) -> ScrapeRun {
        let mut tried_urls = 0;
        let mut fetch_errors = Vec::new();

        for url in self.candidate_urls(date) {
            tried_urls += 1;
            info!("Fetching {}", url);

            match self.source.fetch_page(&url).await {
                Ok(markup) => {
                    return ScrapeRun {
                        outcome: self.classify(url, &markup),
                        tried_urls,
                        fetch_errors,
                    };
                }
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    fetch_errors.push(format!("{}: {}", url, e));
                }
            }
        }

        ScrapeRun {
            outcome: ScrapeOutcome::FetchFailed,
            tried_urls,
            fetch_errors,
        }
    }

    fn classify(&self, url: String, markup: &str) -> ScrapeOutcome {
        let extraction = self.process_markup(markup);
        if extraction.matches.is_empty() {
            info!("No matches found on {}", url);
            ScrapeOutcome::EmptyPage { url, extraction }
        } else {
            info!("Extracted {} matches from {}", extraction.matches.len(), url);
            ScrapeOutcome::Scraped { url, extraction }
        }
    }

    /// Matches for the requested date. Never fails: anything short of a
    /// successful extraction is answered with the fallback list.
    pub async fn fetch_matches(&self, requested: Option<&str>) -> MatchesResponse {
        self.fetch_matches_on(requested, utils::dates::today()).await
    }

    pub async fn fetch_matches_on(&self, requested: Option<&str>, today: NaiveDate) -> MatchesResponse {
        let resolved = resolve_date(requested, today);
        if !resolved.valid && requested.is_some() {
            warn!("Unparsable date {:?}, using today", requested);
        }

        let run = self.scrape(resolved.date).await;
        self.respond(run, requested, resolved, today)
    }

    /// Same as `fetch_matches_on`, for markup already in hand (`origin` names it)
    pub fn matches_from_markup(
        &self,
        markup: &str,
        origin: &str,
        requested: Option<&str>,
        today: NaiveDate,
    ) -> MatchesResponse {
        let resolved = resolve_date(requested, today);
        let run = ScrapeRun {
            outcome: self.classify(origin.to_string(), markup),
            tried_urls: 1,
            fetch_errors: Vec::new(),
        };
        self.respond(run, requested, resolved, today)
    }

    fn respond(
        &self,
        run: ScrapeRun,
        requested: Option<&str>,
        resolved: ResolvedDate,
        today: NaiveDate,
    ) -> MatchesResponse {
        let mut details = DebugInfo {
            requested_date: requested.map(str::to_string),
            resolved_date: format_site_date(resolved.date),
            date_was_valid: resolved.valid,
            tried_urls: run.tried_urls,
            fetch_errors: run.fetch_errors,
            ..Default::default()
        };

        let empty_extraction = match run.outcome {
            ScrapeOutcome::Scraped { url, extraction } => {
                record_reports(&mut details, &extraction.reports);
                details.parser = SCRAPED_PARSER.to_string();
                details.scraping_success = true;
                details.extracted_matches = extraction.matches.len();
                details.successful_url = Some(url.clone());

                return MatchesResponse {
                    total_matches: extraction.matches.len(),
                    matches: extraction.matches,
                    timestamp: Utc::now(),
                    source: url,
                    debug: Some(details),
                };
            }
            ScrapeOutcome::EmptyPage { url, extraction } => {
                details.empty_page = Some(url);
                Some(extraction)
            }
            ScrapeOutcome::FetchFailed => None,
        };

        if let Some(extraction) = empty_extraction {
            record_reports(&mut details, &extraction.reports);
        }

        info!("Serving fallback matches for {}", details.resolved_date);
        let mut rng = match self.fallback_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let matches = generate_for_date(resolved, today, &mut rng);

        details.parser = FALLBACK_PARSER.to_string();
        details.sample_data = true;

        MatchesResponse {
            total_matches: matches.len(),
            matches,
            timestamp: Utc::now(),
            source: FALLBACK_SOURCE.to_string(),
            debug: Some(details),
        }
    }
}

fn record_reports(details: &mut DebugInfo, reports: &[StrategyReport]) {
    details.strategy_counts = reports
        .iter()
        .map(|r| (r.name.to_string(), r.candidates.len()))
        .collect::<BTreeMap<_, _>>();
    details.strategy_errors = reports
        .iter()
        .filter_map(|r| r.error.clone().map(|e| (r.name.to_string(), e)))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const GALATASARAY_PAGE: &str =
        "<html><body><table><tr><td>19:30</td><td>Galatasaray - Fenerbahçe</td>\
         <td>2.10</td><td>3.20</td><td>3.50</td></tr></table></body></html>";

    /// Serves canned pages; unknown URLs fail with a 404
    #[derive(Default)]
    struct CannedSource {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedSource {
        fn with_page(mut self, url: &str, markup: &str) -> Self {
            self.pages.insert(url.to_string(), markup.to_string());
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl PageSource for CannedSource {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or(FetchError::Status(reqwest::StatusCode::NOT_FOUND))
        }
    }

    fn today() -> NaiveDate {
        // A Wednesday
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn pipeline(source: CannedSource, urls: &[&str]) -> MatchPipeline<CannedSource> {
        MatchPipeline::new(source, urls.iter().map(|u| u.to_string()).collect())
            .with_fallback_seed(Some(11))
    }

    fn assert_odds_formatted(response: &MatchesResponse) {
        for m in &response.matches {
            for value in [&m.odds.home, &m.odds.draw, &m.odds.away] {
                let (_, frac) = value.split_once('.').unwrap();
                assert_eq!(frac.len(), 2, "{}", value);
                assert!(value.parse::<f64>().unwrap() >= 1.0);
            }
        }
    }

    #[tokio::test]
    async fn test_successful_scrape() {
        let source = CannedSource::default().with_page("https://site.test/program", GALATASARAY_PAGE);
        let pipeline = pipeline(source, &["https://site.test/program"]);

        let response = pipeline.fetch_matches_on(None, today()).await;

        assert_eq!(response.source, "https://site.test/program");
        assert_eq!(response.total_matches, 1);
        let m = &response.matches[0];
        assert_eq!(m.id, 1);
        assert_eq!(m.time, "19:30");
        assert_eq!(m.home_team, "Galatasaray");
        assert_eq!(m.away_team, "Fenerbahçe");
        assert_eq!(
            (m.odds.home.as_str(), m.odds.draw.as_str(), m.odds.away.as_str()),
            ("2.10", "3.20", "3.50")
        );
        assert_eq!(m.league, "MISC");
        assert_eq!(m.status, MatchStatus::Upcoming);

        let debug = response.debug.unwrap();
        assert_eq!(debug.parser, SCRAPED_PARSER);
        assert!(debug.scraping_success);
        assert!(!debug.sample_data);
        assert!(!debug.date_was_valid);
        assert_eq!(debug.resolved_date, "15.05.2024");
        assert_eq!(debug.strategy_counts["row-scan"], 1);
    }

    #[tokio::test]
    async fn test_date_placeholder_is_filled() {
        let source = CannedSource::default().with_page("https://site.test/p?d=19.05.2024", GALATASARAY_PAGE);
        let pipeline = pipeline(source, &["https://site.test/p?d={date}"]);

        let response = pipeline.fetch_matches_on(Some("2024-05-19"), today()).await;

        assert_eq!(response.source, "https://site.test/p?d=19.05.2024");
        assert!(response.debug.unwrap().date_was_valid);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_url() {
        let source = CannedSource::default().with_page("https://second.test", GALATASARAY_PAGE);
        let pipeline = pipeline(source, &["https://first.test", "https://second.test"]);

        let response = pipeline.fetch_matches_on(None, today()).await;

        assert_eq!(response.source, "https://second.test");
        let debug = response.debug.unwrap();
        assert_eq!(debug.tried_urls, 2);
        assert_eq!(debug.fetch_errors.len(), 1);
        assert!(debug.fetch_errors[0].starts_with("https://first.test"));
    }

    #[tokio::test]
    async fn test_empty_page_falls_back_without_trying_more_urls() {
        let source = CannedSource::default()
            .with_page("https://first.test", "<html><body><p>Bakım çalışması</p></body></html>")
            .with_page("https://second.test", GALATASARAY_PAGE);
        let pipeline = pipeline(source, &["https://first.test", "https://second.test"]);

        let response = pipeline.fetch_matches_on(Some("19.05.2024"), today()).await;

        assert_eq!(response.source, FALLBACK_SOURCE);
        // Sunday roster
        assert_eq!(response.matches[0].home_team, "Galatasaray");
        assert_eq!(response.matches.len(), 4);
        assert_eq!(response.total_matches, 4);
        assert_odds_formatted(&response);

        let debug = response.debug.unwrap();
        assert_eq!(debug.parser, FALLBACK_PARSER);
        assert!(debug.sample_data);
        assert!(!debug.scraping_success);
        assert_eq!(debug.empty_page.as_deref(), Some("https://first.test"));
        assert_eq!(debug.tried_urls, 1);
        assert_eq!(pipeline.source.requested(), vec!["https://first.test"]);
    }

    #[tokio::test]
    async fn test_all_urls_failing_falls_back() {
        let pipeline = pipeline(CannedSource::default(), &["https://a.test", "https://b.test"]);

        let response = pipeline.fetch_matches_on(Some("garbage"), today()).await;

        assert_eq!(response.source, FALLBACK_SOURCE);
        // Unparsable date means today, a Wednesday
        assert_eq!(response.matches[0].home_team, "AC Milan");
        let debug = response.debug.unwrap();
        assert_eq!(debug.fetch_errors.len(), 2);
        assert!(debug.empty_page.is_none());
        assert_eq!(debug.requested_date.as_deref(), Some("garbage"));
        assert!(!debug.date_was_valid);
    }

    #[tokio::test]
    async fn test_no_urls_goes_straight_to_fallback() {
        let pipeline = pipeline(CannedSource::default(), &[]);
        let response = pipeline.fetch_matches_on(None, today()).await;

        assert_eq!(response.source, FALLBACK_SOURCE);
        assert_eq!(response.debug.unwrap().tried_urls, 0);
    }

    #[test]
    fn test_duplicate_across_strategies_keeps_row_scan_record() {
        let markup = r#"<html><body>
            <table><tr><td>19:30</td><td>Galatasaray - Fenerbahçe</td>
            <td>2.10</td><td>3.20</td><td>3.50</td></tr></table>
            <script>var matches = [{"time": "19:30", "home": "Galatasaray", "away": "Fenerbahçe",
              "league": "SUPER", "odds": {"home": 2.2, "draw": 3.1, "away": 3.3}}];</script>
            </body></html>"#;
        let pipeline = pipeline(CannedSource::default(), &[]);

        let extraction = pipeline.process_markup(markup);

        assert_eq!(extraction.matches.len(), 1);
        assert_eq!(extraction.matches[0].league, "MISC");
        assert_eq!(extraction.matches[0].odds.home, "2.10");
        let counts: HashMap<_, _> = extraction
            .reports
            .iter()
            .map(|r| (r.name, r.candidates.len()))
            .collect();
        assert_eq!(counts["row-scan"], 1);
        assert_eq!(counts["embedded-json"], 1);
    }

    #[test]
    fn test_malformed_embedded_json_falls_back() {
        let markup = "<html><body><script>var matches = [{home: 'Roma', away: 'Lazio'}];</script></body></html>";
        let pipeline = pipeline(CannedSource::default(), &[]);

        let response = pipeline.matches_from_markup(markup, "page.html", Some("15.05.2024"), today());

        assert_eq!(response.source, FALLBACK_SOURCE);
        assert!(!response.matches.is_empty());
        let debug = response.debug.unwrap();
        assert_eq!(debug.empty_page.as_deref(), Some("page.html"));
        assert!(debug.strategy_errors.contains_key("embedded-json"));
        assert_eq!(debug.strategy_counts["embedded-json"], 0);
    }

    #[test]
    fn test_seeded_fallback_is_reproducible() {
        let a = pipeline(CannedSource::default(), &[]).matches_from_markup("", "x", None, today());
        let b = pipeline(CannedSource::default(), &[]).matches_from_markup("", "x", None, today());
        assert_eq!(a.matches, b.matches);
    }
}

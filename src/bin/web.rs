use anyhow::Context;
use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use iddaa_odds::utils::data::matches_to_csv;
use iddaa_odds::utils::table::{MatchRow, TableQuery};
use iddaa_odds::{AppConfig, MatchPipeline, MatchesResponse, PageSource};
use serde::Deserialize;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const LEAGUE_OPTIONS: [&str; 12] = [
    "TUR1", "ENG1", "ESP1", "GER1", "ITA1", "FRA1", "POR1", "NED1", "BEL1", "SCO1", "UEL", "MISC",
];

const STATUS_OPTIONS: [(&str, &str); 3] = [
    ("upcoming", "Upcoming"),
    ("live", "Live"),
    ("finished", "Finished"),
];

/// (sort key, header label)
const SORT_COLUMNS: [(&str, &str); 12] = [
    ("time", "Time"),
    ("league", "League"),
    ("home", "Home"),
    ("away", "Away"),
    ("odds1", "1"),
    ("oddsX", "X"),
    ("odds2", "2"),
    ("over", "O 2.5"),
    ("under", "U 2.5"),
    ("dc1x", "1X"),
    ("dc12", "12"),
    ("dcx2", "X2"),
];

struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

struct SortLink {
    label: String,
    href: String,
    arrow: &'static str,
}

#[derive(Template)]
#[template(path = "matches.html")]
struct MatchesTemplate {
    date: String,
    resolved_date: String,
    source: String,
    sample_data: bool,
    total_matches: usize,
    rows: Vec<MatchRow>,
    leagues: Vec<SelectOption>,
    statuses: Vec<SelectOption>,
    columns: Vec<SortLink>,
    q: String,
    sort: String,
    order: String,
    fetched_at: String,
}

fn select_options(options: &[(&str, &str)], current: Option<&str>) -> Vec<SelectOption> {
    options
        .iter()
        .map(|(value, label)| SelectOption {
            value: value.to_string(),
            label: label.to_string(),
            selected: current.is_some_and(|c| c.eq_ignore_ascii_case(value)),
        })
        .collect()
}

/// Header links that keep the current filters and flip the order on the active column
fn sort_links(query: &TableQuery) -> Vec<SortLink> {
    let active = query.sort.as_deref().unwrap_or_default();
    let descending = query
        .order
        .as_deref()
        .is_some_and(|o| o.eq_ignore_ascii_case("desc"));

    SORT_COLUMNS
        .iter()
        .map(|(key, label)| {
            let is_active = *key == active;
            let order = if is_active && !descending { "desc" } else { "asc" };

            let mut pairs: Vec<(&str, &str)> = Vec::new();
            for (name, value) in [
                ("date", &query.date),
                ("league", &query.league),
                ("status", &query.status),
                ("q", &query.q),
            ] {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    pairs.push((name, value));
                }
            }
            pairs.push(("sort", *key));
            pairs.push(("order", order));

            let arrow = match (is_active, descending) {
                (false, _) => "",
                (true, false) => " ▲",
                (true, true) => " ▼",
            };

            SortLink {
                label: label.to_string(),
                href: format!("/?{}", encode_query(&pairs)),
                arrow,
            }
        })
        .collect()
}

fn encode_query(pairs: &[(&str, &str)]) -> String {
    let mut url = reqwest::Url::parse("http://localhost/").expect("static base URL");
    url.query_pairs_mut().extend_pairs(pairs);
    url.query().unwrap_or_default().to_string()
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => ApiError::Render(err).into_response(),
        }
    }
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("failed to render template: {0}")]
    Render(#[from] askama::Error),
    #[error("failed to export matches: {0}")]
    Export(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        internal_error(self.to_string())
    }
}

fn internal_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal server error",
            "message": message,
            "timestamp": Utc::now(),
        })),
    )
        .into_response()
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };
    error!("Handler panicked: {}", message);
    internal_error(message)
}

#[derive(Debug, Default, Deserialize)]
struct DateQuery {
    date: Option<String>,
}

type SharedPipeline<S> = Arc<MatchPipeline<S>>;

async fn api_matches<S: PageSource + 'static>(
    State(pipeline): State<SharedPipeline<S>>,
    Query(query): Query<DateQuery>,
) -> Json<MatchesResponse> {
    Json(pipeline.fetch_matches(query.date.as_deref()).await)
}

async fn api_matches_csv<S: PageSource + 'static>(
    State(pipeline): State<SharedPipeline<S>>,
    Query(query): Query<DateQuery>,
) -> Result<Response, ApiError> {
    let response = pipeline.fetch_matches(query.date.as_deref()).await;
    let csv = matches_to_csv(&response.matches)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"matches.csv\""),
        ],
        csv,
    )
        .into_response())
}

async fn home<S: PageSource + 'static>(
    State(pipeline): State<SharedPipeline<S>>,
    Query(query): Query<TableQuery>,
) -> impl IntoResponse {
    let response = pipeline.fetch_matches(query.date.as_deref()).await;
    let rows = query.apply(&response.matches);
    let details = response.debug.unwrap_or_default();

    let league_options: Vec<(&str, &str)> = LEAGUE_OPTIONS.iter().map(|l| (*l, *l)).collect();
    let template = MatchesTemplate {
        date: query.date.clone().unwrap_or_default(),
        resolved_date: details.resolved_date,
        source: response.source,
        sample_data: details.sample_data,
        total_matches: response.total_matches,
        rows,
        leagues: select_options(&league_options, query.league.as_deref()),
        statuses: select_options(&STATUS_OPTIONS, query.status.as_deref()),
        columns: sort_links(&query),
        q: query.q.clone().unwrap_or_default(),
        sort: query.sort.clone().unwrap_or_default(),
        order: query.order.clone().unwrap_or_default(),
        fetched_at: response.timestamp.format("%d.%m.%Y %H:%M:%S UTC").to_string(),
    };

    HtmlTemplate(template)
}

fn app<S: PageSource + 'static>(pipeline: MatchPipeline<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(home::<S>))
        .route("/api/matches", get(api_matches::<S>))
        .route("/api/matches.csv", get(api_matches_csv::<S>))
        .with_state(Arc::new(pipeline))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let pipeline = MatchPipeline::from_config(&config).context("Failed to build HTTP client")?;

    info!(
        "Configured {} source URLs, {}s fetch timeout",
        config.source_urls.len(),
        config.fetch_timeout.as_secs()
    );

    println!("\nStarting web server at http://{}", config.bind_addr);
    println!("  - JSON: http://{}/api/matches", config.bind_addr);
    println!("  - CSV:  http://{}/api/matches.csv", config.bind_addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    axum::serve(listener, app(pipeline))
        .await
        .context("Server error")?;

    Ok(())
}

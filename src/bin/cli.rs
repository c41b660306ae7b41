use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use iddaa_odds::utils::data::{matches_to_csv, save_matches_to_csv, save_matches_to_json};
use iddaa_odds::utils::dates::today;
use iddaa_odds::utils::odds::double_chance_str;
use iddaa_odds::{AppConfig, Match, MatchPipeline, MatchesResponse};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// Fetch the İddaa program for a date and print the extracted matches
#[derive(Debug, Parser)]
#[command(name = "iddaa", version)]
struct Args {
    /// Date as DD.MM.YYYY or YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<String>,

    /// Extract from a saved HTML page instead of fetching
    #[arg(long, value_name = "HTML")]
    file: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Seed for the sample data used when nothing is extracted
    #[arg(long)]
    seed: Option<u64>,

    /// Also save the matches to a file (.json, anything else is CSV)
    #[arg(long, value_name = "PATH")]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so json/csv output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if args.seed.is_some() {
        config.fallback_seed = args.seed;
    }
    let pipeline = MatchPipeline::from_config(&config).context("Failed to build HTTP client")?;

    let response = match &args.file {
        Some(path) => {
            let markup = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path))?;
            pipeline.matches_from_markup(&markup, path, args.date.as_deref(), today())
        }
        None => pipeline.fetch_matches(args.date.as_deref()).await,
    };

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&response).context("Failed to serialize matches")?;
            println!("{}", json);
        }
        OutputFormat::Csv => print!("{}", matches_to_csv(&response.matches)?),
        OutputFormat::Table => print_table(&response),
    }

    if let Some(path) = &args.output {
        if path.ends_with(".json") {
            save_matches_to_json(&response.matches, path)?;
        } else {
            save_matches_to_csv(&response.matches, path)?;
        }
        eprintln!("Saved {} matches to {}", response.total_matches, path);
    }

    Ok(())
}

fn print_table(response: &MatchesResponse) {
    let date = response
        .debug
        .as_ref()
        .map(|d| d.resolved_date.as_str())
        .unwrap_or_default();

    println!("İDDAA PROGRAM {}\n", date);
    if response.debug.as_ref().is_some_and(|d| d.sample_data) {
        println!("No fixtures could be extracted; showing sample data.\n");
    } else {
        println!("Source: {}\n", response.source);
    }

    if response.matches.is_empty() {
        println!("No matches found.");
        return;
    }

    println!(
        "{:<5} {:<6} {:<22} {:<22} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}  {}",
        "Time", "League", "Home", "Away", "1", "X", "2", "1X", "12", "X2", "Status"
    );
    for m in &response.matches {
        println!("{}", format_row(m));
    }
    println!("\n{} matches", response.total_matches);
}

fn format_row(m: &Match) -> String {
    let status = match &m.score {
        Some(score) => format!("{} {}", m.status.as_str(), score),
        None => m.status.as_str().to_string(),
    };

    format!(
        "{:<5} {:<6} {:<22} {:<22} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}  {}",
        m.time,
        m.league,
        m.home_team,
        m.away_team,
        m.odds.home,
        m.odds.draw,
        m.odds.away,
        double_chance_str(&m.odds.home, &m.odds.draw),
        double_chance_str(&m.odds.home, &m.odds.away),
        double_chance_str(&m.odds.draw, &m.odds.away),
        status
    )
}

use crate::models::Match;
use crate::utils::odds::double_chance_str;
use anyhow::{Context, Result};

const CSV_HEADER: [&str; 15] = [
    "Time", "League", "Status", "Home Team", "Away Team", "Score", "Code", "1", "X", "2",
    "Over 2.5", "Under 2.5", "1X", "12", "X2",
];

/// Render matches as CSV, one row per match plus a header row
pub fn matches_to_csv(matches: &[Match]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .context("Failed to write CSV header")?;

    for m in matches {
        let (over, under) = m
            .over_under
            .as_ref()
            .map(|ou| (ou.over25.as_str(), ou.under25.as_str()))
            .unwrap_or(("", ""));
        let dc_1x = double_chance_str(&m.odds.home, &m.odds.draw);
        let dc_12 = double_chance_str(&m.odds.home, &m.odds.away);
        let dc_x2 = double_chance_str(&m.odds.draw, &m.odds.away);

        writer
            .write_record([
                m.time.as_str(),
                m.league.as_str(),
                m.status.as_str(),
                m.home_team.as_str(),
                m.away_team.as_str(),
                m.score.as_deref().unwrap_or(""),
                m.match_code.as_str(),
                m.odds.home.as_str(),
                m.odds.draw.as_str(),
                m.odds.away.as_str(),
                over,
                under,
                dc_1x.as_str(),
                dc_12.as_str(),
                dc_x2.as_str(),
            ])
            .with_context(|| format!("Failed to write CSV row for match {}", m.id))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

/// Save matches to a CSV file
pub fn save_matches_to_csv(matches: &[Match], filename: &str) -> Result<()> {
    let csv = matches_to_csv(matches)?;
    std::fs::write(filename, csv).context("Failed to write CSV file")?;
    Ok(())
}

/// Save matches to a pretty-printed JSON file
pub fn save_matches_to_json(matches: &[Match], filename: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(matches).context("Failed to serialize matches")?;
    std::fs::write(filename, json).context("Failed to write JSON file")?;
    Ok(())
}

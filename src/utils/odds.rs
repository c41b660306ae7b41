use crate::models::NO_ODDS;

/// Smallest value a scraped decimal may have to count as odds
pub const MIN_SCRAPED_ODDS: f64 = 1.0;
/// Largest value a scraped decimal may have to count as odds
pub const MAX_SCRAPED_ODDS: f64 = 50.0;

/// Parse a decimal-odds string, accepting either `.` or `,` as separator
pub fn parse_decimal_odds(raw: &str) -> Option<f64> {
    let value = raw.trim().replace(',', ".").parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Whether a scraped decimal falls in the range treated as betting odds
pub fn is_plausible_odds(value: f64) -> bool {
    (MIN_SCRAPED_ODDS..=MAX_SCRAPED_ODDS).contains(&value)
}

/// Format decimal odds with exactly two decimals
pub fn format_odds(value: f64) -> String {
    format!("{:.2}", value)
}

/// Canonical form of a raw odds string: period separator, two decimals.
/// Anything unparsable or below 1.00 becomes the "no odds" sentinel.
pub fn normalize_odds(raw: &str) -> String {
    match parse_decimal_odds(raw) {
        Some(value) if value >= 1.0 => format_odds(value),
        _ => NO_ODDS.to_string(),
    }
}

/// Convert decimal odds to implied probability
/// 2.00 means a 50% implied chance, 4.00 means 25%
pub fn implied_probability(decimal_odds: f64) -> f64 {
    if decimal_odds <= 0.0 {
        return 0.0;
    }
    1.0 / decimal_odds
}

/// Double chance odds covering two of the three outcomes.
/// Combines the implied probabilities and converts back, floored at 1.01.
pub fn double_chance(odds1: f64, odds2: f64) -> f64 {
    let combined = implied_probability(odds1) + implied_probability(odds2);
    if combined <= 0.0 {
        return 1.01;
    }
    (1.0 / combined).max(1.01)
}

/// Double chance from two formatted odds strings, as shown in tables
pub fn double_chance_str(odds1: &str, odds2: &str) -> String {
    match (parse_decimal_odds(odds1), parse_decimal_odds(odds2)) {
        (Some(o1), Some(o2)) => format_odds(double_chance(o1, o2)),
        _ => "1.20".to_string(),
    }
}

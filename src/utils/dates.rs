use chrono::{Datelike, Local, NaiveDate};

/// Date formats accepted from callers, tried in order
const ACCEPTED_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

/// A requested calendar date after parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    /// False when the input was missing or unparsable and `today` was used
    pub valid: bool,
}

impl ResolvedDate {
    /// Days from `today` to this date; negative for past dates
    pub fn days_from(&self, today: NaiveDate) -> i64 {
        (self.date - today).num_days()
    }

    /// 0 = Sunday .. 6 = Saturday
    pub fn day_of_week(&self) -> u32 {
        self.date.weekday().num_days_from_sunday()
    }
}

/// Parse `DD.MM.YYYY` or `YYYY-MM-DD`; anything else falls back to `today`
pub fn resolve_date(input: Option<&str>, today: NaiveDate) -> ResolvedDate {
    let parsed = input.map(str::trim).filter(|s| !s.is_empty()).and_then(|s| {
        ACCEPTED_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    });

    match parsed {
        Some(date) => ResolvedDate { date, valid: true },
        None => ResolvedDate {
            date: today,
            valid: false,
        },
    }
}

/// Format as `DD.MM.YYYY`, the form the source site and UI use
pub fn format_site_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Current local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

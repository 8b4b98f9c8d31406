use crate::taxonomy::metric::normalize_metric;
use chrono::NaiveDate;
use regex::Regex;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::LazyLock;

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(20\d{2}|19\d{2})\b").expect("Hardcode regex pattern"));
static QUARTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bq([1-4])\b.*\b(20\d{2}|19\d{2})\b").expect("Hardcode regex pattern"));
static MONTH_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\b").expect("Hardcode regex pattern")
});
static DAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([12][0-9]|3[01]|0?[1-9])\b").expect("Hardcode regex pattern"));
static MONTH_SHORT_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[-/ ](\d{2}|\d{4})\b").expect("Hardcode regex pattern")
});

/// Day used when a header names a month without a day.
const MONTH_DAY: u32 = 28;

/// Reporting period read from a column header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum KnownPeriod {
    Year(i32),
    Date(NaiveDate),
}

impl Display for KnownPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year:04}"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

fn month_number(word: &str) -> Option<u32> {
    let month = match word {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

fn quarter_end(quarter: u32) -> (u32, u32) {
    match quarter {
        1 => (3, 31),
        2 => (6, 30),
        3 => (9, 30),
        _ => (12, 31),
    }
}

/// Date with `day`, or with [`MONTH_DAY`] when `day` does not exist in that month.
fn month_date(year: i32, month: u32, day: u32) -> Option<KnownPeriod> {
    NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(year, month, MONTH_DAY))
        .map(KnownPeriod::Date)
}

/// Infers a period from a column header, trying in order: quarter (its end
/// date), month name with optional day and a year, `FY` or bare year, and
/// month with a two digit year.
pub(crate) fn parse_known_period(col_header: &str) -> Option<KnownPeriod> {
    let text = normalize_metric(col_header);
    let year = YEAR
        .captures(&text)
        .and_then(|captures| captures[1].parse::<i32>().ok());

    if let Some(captures) = QUARTER.captures(&text) {
        let quarter = captures[1].parse::<u32>().ok()?;
        let quarter_year = captures[2].parse::<i32>().ok()?;
        let (month, day) = quarter_end(quarter);
        return NaiveDate::from_ymd_opt(quarter_year, month, day).map(KnownPeriod::Date);
    }

    let month = MONTH_WORD
        .find_iter(&text)
        .find_map(|word| month_number(word.as_str()));
    if let (Some(month), Some(year)) = (month, year) {
        let day = DAY
            .captures(&text)
            .and_then(|captures| captures[1].parse::<u32>().ok())
            .unwrap_or(MONTH_DAY);
        return month_date(year, month, day);
    }

    // `FY 2022` and a bare `2022` both name the year
    if let Some(year) = year {
        return Some(KnownPeriod::Year(year));
    }

    let captures = MONTH_SHORT_YEAR.captures(&text)?;
    let month = month_number(&captures[1])?;
    let mut year = captures[2].parse::<i32>().ok()?;
    if year < 100 {
        year += if year <= 69 { 2000 } else { 1900 };
    }
    month_date(year, month, MONTH_DAY)
}

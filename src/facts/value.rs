use crate::facts::unit::Unit;
use std::fmt;

const ERROR_CODES: [&str; 4] = ["#N/A", "#DIV/0!", "#VALUE!", "NAN"];
const DASHES: [&str; 2] = ["-", "\u{2014}"];

/// Outcome of parsing one data cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum ParseStatus {
    Ok,
    Blank,
    ErrorCode,
    Dash,
    NonNumeric,
}

impl ParseStatus {
    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Blank => "blank",
            Self::ErrorCode => "error_code",
            Self::Dash => "dash",
            Self::NonNumeric => "non_numeric",
        }
    }
}

impl fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a raw cell into a signed number, classifying cells that hold none.
///
/// `(1,234)` reads as `-1234`. Percentages keep their literal value, so
/// `12.3%` reads as `12.3` whatever the resolved unit.
pub(crate) fn parse_number_with_status(raw: Option<&str>, _unit: Unit) -> (Option<f64>, ParseStatus) {
    let text = raw.map(str::trim).unwrap_or("");
    if text.is_empty() {
        return (None, ParseStatus::Blank);
    }
    if ERROR_CODES.contains(&text.to_uppercase().as_str()) {
        return (None, ParseStatus::ErrorCode);
    }

    let (negative, text) = match text.strip_prefix('(').and_then(|text| text.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, text),
    };
    let cleaned: String = text.chars().filter(|c| !matches!(c, '%' | '$' | ',')).collect();
    let cleaned = cleaned.trim();
    if DASHES.contains(&cleaned) {
        return (None, ParseStatus::Dash);
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => (Some(if negative { -value } else { value }), ParseStatus::Ok),
        _ => (None, ParseStatus::NonNumeric),
    }
}

/// Per-status count of data cells that yielded no fact.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SkipTally {
    pub(crate) blank: usize,
    pub(crate) error_code: usize,
    pub(crate) dash: usize,
    pub(crate) non_numeric: usize,
}

impl SkipTally {
    pub(crate) fn record(&mut self, status: ParseStatus) {
        match status {
            ParseStatus::Ok => (),
            ParseStatus::Blank => self.blank += 1,
            ParseStatus::ErrorCode => self.error_code += 1,
            ParseStatus::Dash => self.dash += 1,
            ParseStatus::NonNumeric => self.non_numeric += 1,
        }
    }

    pub(crate) const fn total(&self) -> usize {
        self.blank + self.error_code + self.dash + self.non_numeric
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_statuses() {
        assert_eq!(parse_number_with_status(Some("(1,234)"), Unit::None), (Some(-1234.0), ParseStatus::Ok));
        assert_eq!(parse_number_with_status(Some("12.3%"), Unit::Percent), (Some(12.3), ParseStatus::Ok));
        assert_eq!(parse_number_with_status(Some("$1,000.50"), Unit::Usd), (Some(1000.5), ParseStatus::Ok));
        assert_eq!(parse_number_with_status(Some("-7"), Unit::None), (Some(-7.0), ParseStatus::Ok));
        assert_eq!(parse_number_with_status(Some("\u{2014}"), Unit::None), (None, ParseStatus::Dash));
        assert_eq!(parse_number_with_status(Some("( - )"), Unit::None), (None, ParseStatus::Dash));
        assert_eq!(parse_number_with_status(Some("#N/A"), Unit::None), (None, ParseStatus::ErrorCode));
        assert_eq!(parse_number_with_status(Some("#div/0!"), Unit::None), (None, ParseStatus::ErrorCode));
        assert_eq!(parse_number_with_status(Some("nan"), Unit::None), (None, ParseStatus::ErrorCode));
        assert_eq!(parse_number_with_status(Some(""), Unit::None), (None, ParseStatus::Blank));
        assert_eq!(parse_number_with_status(None, Unit::None), (None, ParseStatus::Blank));
        assert_eq!(parse_number_with_status(Some("n.m."), Unit::None), (None, ParseStatus::NonNumeric));
        assert_eq!(parse_number_with_status(Some("inf"), Unit::None), (None, ParseStatus::NonNumeric));
    }

    #[test]
    fn tally_counts_each_status() {
        let mut tally = SkipTally::default();
        for status in [ParseStatus::Ok, ParseStatus::Blank, ParseStatus::Dash, ParseStatus::Dash, ParseStatus::NonNumeric] {
            tally.record(status);
        }
        assert_eq!(tally, SkipTally { blank: 1, error_code: 0, dash: 2, non_numeric: 1 });
        assert_eq!(tally.total(), 4);
    }
}

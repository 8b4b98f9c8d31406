use crate::error::DatabookError;
use chrono::Duration;
use chrono::NaiveDate;

/// How the stored value of an xlsx cell is to be read.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    Boolean,
    Number,
    /// Serial day number with a date format
    Date,
    /// Serial day number with a date and time format
    DateTime,
    /// Day fraction with a time format
    Time,
    /// ISO 8601 text (`t="d"`)
    IsoDateTime,
    InlineString,
    /// Index into the shared string table
    SharedString,
    /// Error literal such as `#N/A`
    Error,
}

impl CellType {
    /// Cell type from the `t` attribute of a `<c>` element.
    pub(crate) fn from_type_attribute(kind: Option<&str>) -> Self {
        match kind {
            Some("inlineStr") | Some("str") => Self::InlineString,
            Some("s") => Self::SharedString,
            Some("d") => Self::IsoDateTime,
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            _ => Self::Number,
        }
    }

    /// Cell type implied by a built-in number format id.
    pub(crate) fn parse_builtin_number_format_id(id: &str) -> Option<Self> {
        match id {
            "22" => Some(Self::DateTime),
            "14" | "15" | "16" | "17" => Some(Self::Date),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::Time),
            _ => None,
        }
    }

    /// Cell type implied by a custom number format code. Quoted literals,
    /// escaped characters and bracketed sections such as colors are ignored.
    pub(crate) fn parse_custom_number_format(format: &str) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::DateTime,
            (true, false) => Self::Date,
            (false, true) => Self::Time,
            (false, false) => Self::Number,
        }
    }

    /// Renders a stored cell value as display text.
    ///
    /// Numbers keep their stored form, booleans read `TRUE`/`FALSE` and dates
    /// become ISO text. A date value that is not a serial number is kept as is.
    pub(crate) fn render(&self, value: &str, is_1904: bool, shared_strings: &[String]) -> Option<String> {
        let text = match self {
            Self::Empty => return None,
            Self::Boolean => if value == "1" { "TRUE" } else { "FALSE" }.to_owned(),
            Self::Date => to_date_string(value, is_1904).unwrap_or_else(|_| value.to_owned()),
            Self::DateTime => to_datetime_string(value, is_1904).unwrap_or_else(|_| value.to_owned()),
            Self::Time => to_time_string(value).unwrap_or_else(|_| value.to_owned()),
            Self::IsoDateTime => value.replacen('T', " ", 1),
            Self::SharedString => shared_strings.get(value.trim().parse::<usize>().ok()?)?.to_owned(),
            Self::Number | Self::InlineString | Self::Error => value.to_owned(),
        };
        Some(text)
    }
}

/// Converts a serial day number to `YYYY-MM-DD`, honoring the 1900 leap year bug.
pub(crate) fn to_date_string(value: &str, is_1904: bool) -> Result<String, DatabookError> {
    let days = value.trim().parse::<f64>()?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    let date = epoch + Duration::days(days + offset);
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Converts a day fraction to `HH:MM:SS`, with milliseconds when present.
pub(crate) fn to_time_string(value: &str) -> Result<String, DatabookError> {
    let fraction = value.trim().parse::<f64>()?.fract();
    let mut rest = (fraction * 86_400_000f64).round() as i64;
    let milliseconds = rest % 1_000;
    rest /= 1_000;
    let seconds = rest % 60;
    rest /= 60;
    let minutes = rest % 60;
    let hours = rest / 60;
    if milliseconds > 0 {
        Ok(format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}"))
    } else {
        Ok(format!("{hours:02}:{minutes:02}:{seconds:02}"))
    }
}

/// Converts a serial date-time to `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, DatabookError> {
    Ok(format!("{} {}", to_date_string(value, is_1904)?, to_time_string(value)?))
}

use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use std::fmt::Display;

/// Storage types of worksheet cells, as declared by the `t` attribute and the cell style.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (0/1)
    Boolean,
    /// Plain numeric values
    Number,
    /// Numbers formatted as a date and time
    NumberDateTime,
    /// Numbers formatted as a date
    NumberDate,
    /// Numbers formatted as a time of day
    NumberTime,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Inline or formula string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error literals such as `#N/A`
    Error,
}

impl CellType {
    /// Maps built-in number format ids to date/time cell types.
    pub(crate) fn parse_builtin_number_format_id(id: &str) -> Option<Self> {
        match id {
            "22" => Some(Self::NumberDateTime),
            "14" | "15" | "16" | "17" => Some(Self::NumberDate),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::NumberTime),
            _ => None,
        }
    }

    /// Detects date/time patterns in a custom number format code.
    /// Quoted literals, escaped characters and bracketed sections (colors, conditions) are ignored.
    pub(crate) fn parse_custom_number_format(format: &str) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_bracket = false;
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
            (true, true) => Self::NumberDateTime,
            (true, false) => Self::NumberDate,
            (false, true) => Self::NumberTime,
            (false, false) => Self::Number,
        }
    }
}

/// Converts a BIFF/OOXML error code to its literal.
pub(crate) fn to_error_value(code: &str) -> &str {
    match code {
        "#NULL!" | "#DIV/0!" | "#VALUE!" | "#REF!" | "#NAME?" | "#NUM!" | "#N/A" | "#GETTING_DATA" => code,
        _ => "#ERROR!",
    }
}

/// Effective content of one grid cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// The numeric-or-absent coercion shared by extraction and splicing.
    /// Only native numbers qualify; text, booleans and dates never do.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// String form with surrounding whitespace removed, empty for empty cells.
    pub fn to_trimmed_string(&self) -> String {
        self.to_string().trim().to_owned()
    }

    /// Builds a date/time value from a spreadsheet serial number.
    pub(crate) fn from_serial(kind: CellType, serial: f64, is_1904: bool) -> CellValue {
        match kind {
            CellType::NumberTime if serial < 1.0 => CellValue::Time(serial_to_time(serial)),
            CellType::NumberDate | CellType::NumberDateTime | CellType::NumberTime => {
                match serial_to_datetime(serial, is_1904) {
                    Some(datetime) => CellValue::DateTime(datetime),
                    None => CellValue::Number(serial),
                }
            }
            _ => CellValue::Number(serial),
        }
    }
}

/// Parses text as a number the way delimited sources are checked: surrounding whitespace is
/// ignored and anything `f64` cannot parse is rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        text.parse::<f64>().ok().filter(|value| value.is_finite())
    }
}

/// Renders a number in shortest form: integral values carry no fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(value) => write!(f, "{}", format_number(*value)),
            CellValue::Text(text) => write!(f, "{}", text),
            CellValue::Boolean(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Time(time) => write!(f, "{}", time.format("%H:%M:%S")),
        }
    }
}

/// Converts a date serial to a timestamp.
/// Serials below 60 in the 1900 system are shifted by one day for the Lotus 1-2-3 leap year bug.
fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::try_days(days.checked_add(offset)?)?)?;
    Some(date.and_time(serial_to_time(serial.fract())))
}

fn serial_to_time(fraction: f64) -> NaiveTime {
    let milliseconds = (fraction.abs() * 86_400_000f64).round() as i64;
    NaiveTime::MIN + Duration::milliseconds(milliseconds.min(86_399_999))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_native_numbers_are_numeric() {
        assert_eq!(CellValue::Number(10.5).to_number(), Some(10.5));
        assert_eq!(CellValue::Text("10".to_owned()).to_number(), None);
        assert_eq!(CellValue::Text("N/A".to_owned()).to_number(), None);
        assert_eq!(CellValue::Boolean(true).to_number(), None);
        assert_eq!(CellValue::Empty.to_number(), None);
    }

    #[test]
    fn parses_delimited_numbers() {
        assert_eq!(parse_number("12"), Some(12.0));
        assert_eq!(parse_number(" -3.5 "), Some(-3.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn formats_numbers_in_shortest_form() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(10.25), "10.25");
        assert_eq!(CellValue::Number(30.0).to_string(), "30");
    }

    #[test]
    fn trims_string_form() {
        assert_eq!(CellValue::Text("  H1 ".to_owned()).to_trimmed_string(), "H1");
        assert_eq!(CellValue::Empty.to_trimmed_string(), "");
        assert!(CellValue::Text(String::new()).is_empty());
    }

    #[test]
    fn detects_custom_date_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd"), CellType::NumberDate);
        assert_eq!(CellType::parse_custom_number_format("yyyy/m/d h:mm"), CellType::NumberDateTime);
        assert_eq!(CellType::parse_custom_number_format("[h]:mm:ss"), CellType::NumberTime);
        assert_eq!(CellType::parse_custom_number_format("#,##0.00"), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00\"days\""), CellType::Number);
        assert_eq!(CellType::parse_builtin_number_format_id("14"), Some(CellType::NumberDate));
        assert_eq!(CellType::parse_builtin_number_format_id("2"), None);
    }

    #[test]
    fn converts_serials_to_dates() {
        let value = CellValue::from_serial(CellType::NumberDate, 45292.0, false);
        assert_eq!(value.to_string(), "2024-01-01 00:00:00");
        let value = CellValue::from_serial(CellType::NumberDateTime, 45292.5, false);
        assert_eq!(value.to_string(), "2024-01-01 12:00:00");
        let value = CellValue::from_serial(CellType::NumberTime, 0.25, false);
        assert_eq!(value.to_string(), "06:00:00");
        let value = CellValue::from_serial(CellType::NumberDate, 0.0, true);
        assert_eq!(value.to_string(), "1904-01-01 00:00:00");
        assert_eq!(CellValue::from_serial(CellType::Number, 3.0, false), CellValue::Number(3.0));
    }

    #[test]
    fn out_of_range_serials_stay_numbers() {
        assert_eq!(CellValue::from_serial(CellType::NumberDate, 1e15, false), CellValue::Number(1e15));
        assert_eq!(CellValue::from_serial(CellType::NumberDateTime, -1e15, true), CellValue::Number(-1e15));
        assert_eq!(CellValue::from_serial(CellType::NumberDate, f64::MAX, false), CellValue::Number(f64::MAX));
    }
}

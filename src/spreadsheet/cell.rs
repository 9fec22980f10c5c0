use crate::record::CellValue;
use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use iso8601_duration::Duration as IsoDuration;

/// How the raw text of a cell is to be interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean stored as `1`/`0`
    Boolean,
    /// Plain number
    Number,
    /// Date/time serial counted from the 1900 epoch
    NumberDateTime1900,
    /// Date serial counted from the 1900 epoch
    NumberDate1900,
    /// Time fraction of a day
    NumberTime1900,
    /// Date/time serial counted from the 1904 epoch
    NumberDateTime1904,
    /// Date serial counted from the 1904 epoch
    NumberDate1904,
    /// Time fraction of a day (1904 workbook)
    NumberTime1904,
    /// ISO 8601 date or date/time text
    IsoDateTime,
    /// ISO 8601 duration text (ODS time-of-day)
    IsoDuration,
    /// Text held in the cell itself
    InlineString,
    /// Index into the shared string table
    SharedString,
    /// Error value such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Built-in OOXML number format ids that denote dates and times.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => {
                Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 })
            }
            _ => None,
        }
    }

    /// Classifies a custom format code by looking for date (`y`, `d`) and time
    /// (`h`, `s`) tokens outside literals, escapes and bracketed sections.
    /// `m` is ambiguous between month and minute and is ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_literal => is_escaped = true,

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

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }
}

/// A non-empty cell read from a worksheet.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw cell text; for shared strings the resolved string once loaded
    pub(crate) value: String,
}

impl Cell {
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Applies the coercion policy: raw text plus type hint to a typed value.
    pub(crate) fn to_value(&self) -> Result<CellValue, String> {
        match self.kind {
            CellType::Empty => Ok(CellValue::Empty),
            CellType::Boolean => Ok(CellValue::Bool(self.value == "1" || self.value.eq_ignore_ascii_case("true"))),
            CellType::Number => self.to_double().map(CellValue::Number),
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                let serial = self.to_double()?;
                to_datetime(serial, self.kind.is_1904())
                    .map(|datetime| CellValue::Date(datetime.date()))
                    .ok_or_else(|| format!("'{}' is not a valid date serial", self.value))
            }
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                let serial = self.to_double()?;
                to_datetime(serial, self.kind.is_1904())
                    .map(CellValue::DateTime)
                    .ok_or_else(|| format!("'{}' is not a valid date/time serial", self.value))
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                let serial = self.to_double()?;
                to_time(serial.fract())
                    .map(CellValue::Time)
                    .ok_or_else(|| format!("'{}' is not a valid time serial", self.value))
            }
            CellType::IsoDateTime => parse_iso_datetime(&self.value),
            CellType::IsoDuration => parse_iso_time(&self.value),
            CellType::InlineString | CellType::SharedString => Ok(CellValue::Text(self.value.to_owned())),
            CellType::Error => Err(format!("error value '{}'", self.value)),
        }
    }

    fn to_double(&self) -> Result<f64, String> {
        self.value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("parse '{}' to number failed", self.value))
    }
}

const MILLISECONDS_PER_DAY: i64 = 86_400_000;

/// Converts a spreadsheet serial to a date/time, honouring the Lotus 1-2-3
/// leap year bug (serial 60 is the non-existent 1900-02-29) for the 1900 system.
///
/// The serial is rounded to the millisecond before it is split into days and
/// time of day, so 23:59:59.9996 carries over to midnight of the next day.
fn to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let milliseconds = (serial * MILLISECONDS_PER_DAY as f64).round() as i64;
    let days = milliseconds / MILLISECONDS_PER_DAY;
    let offset = if is_1904 {
        1_462
    } else if days < 60 {
        1
    } else {
        0
    };
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::try_days(days + offset)?)?;
    Some(date.and_time(milliseconds_to_time((milliseconds % MILLISECONDS_PER_DAY) as u32)?))
}

/// Converts the fraction of a day to a time of day, rounded to the millisecond.
fn to_time(fraction: f64) -> Option<NaiveTime> {
    let milliseconds = (fraction * MILLISECONDS_PER_DAY as f64).round() as u32;
    // No date to carry into; 23:59:59.9996 stays on the last millisecond
    milliseconds_to_time(milliseconds.min(MILLISECONDS_PER_DAY as u32 - 1))
}

fn milliseconds_to_time(milliseconds: u32) -> Option<NaiveTime> {
    NaiveTime::from_num_seconds_from_midnight_opt(milliseconds / 1_000, (milliseconds % 1_000) * 1_000_000)
}

fn parse_iso_datetime(value: &str) -> Result<CellValue, String> {
    if value.contains('T') {
        let trimmed = value.trim_end_matches('Z');
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map(CellValue::DateTime)
            .map_err(|_| format!("parse '{}' to date/time failed", value))
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(CellValue::Date)
            .map_err(|_| format!("parse '{}' to date failed", value))
    }
}

fn parse_iso_time(value: &str) -> Result<CellValue, String> {
    let duration = value
        .parse::<IsoDuration>()
        .map_err(|_| format!("parse '{}' to iso8601 duration failed", value))?;
    let seconds = (duration.hour * 3600.0 + duration.minute * 60.0 + duration.second) as f64;
    to_time(seconds / 86_400f64)
        .filter(|_| seconds < 86_400f64)
        .map(CellValue::Time)
        .ok_or_else(|| format!("'{}' is not a time of day", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell {
            row: 1,
            col: 2,
            kind,
            value: value.to_owned(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn builtin_number_formats() {
        assert_eq!(CellType::parse_builtin_number_format_id("14", false), Some(CellType::NumberDate1900));
        assert_eq!(CellType::parse_builtin_number_format_id("22", true), Some(CellType::NumberDateTime1904));
        assert_eq!(CellType::parse_builtin_number_format_id("20", false), Some(CellType::NumberTime1900));
        assert_eq!(CellType::parse_builtin_number_format_id("2", false), None);
    }

    #[test]
    fn custom_number_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate1900);
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd hh:mm", false), CellType::NumberDateTime1900);
        assert_eq!(CellType::parse_custom_number_format("hh:mm:ss", true), CellType::NumberTime1904);
        assert_eq!(CellType::parse_custom_number_format("0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("0.00\" days\"", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("#,##0_);\\(#,##0\\)", false), CellType::Number);
    }

    #[test]
    fn numbers_and_text() {
        assert_eq!(cell(CellType::Number, "150").to_value(), Ok(CellValue::Number(150.0)));
        assert_eq!(cell(CellType::Number, "4.0999999999999996").to_value(), Ok(CellValue::Number(4.1)));
        assert!(cell(CellType::Number, "abc").to_value().is_err());
        assert_eq!(cell(CellType::Boolean, "1").to_value(), Ok(CellValue::Bool(true)));
        assert_eq!(cell(CellType::Boolean, "0").to_value(), Ok(CellValue::Bool(false)));
        assert_eq!(
            cell(CellType::InlineString, "AAPL").to_value(),
            Ok(CellValue::Text("AAPL".to_owned()))
        );
        assert!(cell(CellType::Error, "#DIV/0!").to_value().is_err());
    }

    #[test]
    fn serial_dates_1900() {
        assert_eq!(cell(CellType::NumberDate1900, "1").to_value(), Ok(CellValue::Date(date(1900, 1, 1))));
        assert_eq!(cell(CellType::NumberDate1900, "59").to_value(), Ok(CellValue::Date(date(1900, 2, 28))));
        assert_eq!(cell(CellType::NumberDate1900, "61").to_value(), Ok(CellValue::Date(date(1900, 3, 1))));
        assert_eq!(cell(CellType::NumberDate1900, "45292").to_value(), Ok(CellValue::Date(date(2024, 1, 1))));
    }

    #[test]
    fn serial_dates_1904() {
        assert_eq!(cell(CellType::NumberDate1904, "0").to_value(), Ok(CellValue::Date(date(1904, 1, 1))));
        assert_eq!(cell(CellType::NumberDate1904, "43830").to_value(), Ok(CellValue::Date(date(2024, 1, 1))));
    }

    #[test]
    fn serial_times() {
        let datetime = cell(CellType::NumberDateTime1900, "45292.5").to_value().unwrap();
        assert_eq!(datetime, CellValue::DateTime(date(2024, 1, 1).and_hms_opt(12, 0, 0).unwrap()));

        let time = cell(CellType::NumberTime1900, "0.395833333333333").to_value().unwrap();
        assert_eq!(time, CellValue::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));

        let late = cell(CellType::NumberTime1900, "0.99999999").to_value().unwrap();
        assert_eq!(late, CellValue::Time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap()));
    }

    #[test]
    fn serial_rounding_carries_into_the_next_day() {
        let midnight = cell(CellType::NumberDateTime1900, "45366.999999999").to_value().unwrap();
        assert_eq!(midnight, CellValue::DateTime(date(2024, 3, 16).and_hms_opt(0, 0, 0).unwrap()));

        let day = cell(CellType::NumberDate1900, "45366.999999999").to_value().unwrap();
        assert_eq!(day, CellValue::Date(date(2024, 3, 16)));

        let last = cell(CellType::NumberDateTime1900, "45366.99999998").to_value().unwrap();
        assert_eq!(last, CellValue::DateTime(date(2024, 3, 15).and_hms_milli_opt(23, 59, 59, 998).unwrap()));
    }

    #[test]
    fn iso_values() {
        assert_eq!(cell(CellType::IsoDateTime, "2024-03-15").to_value(), Ok(CellValue::Date(date(2024, 3, 15))));
        assert_eq!(
            cell(CellType::IsoDateTime, "2024-03-15T09:30:00").to_value(),
            Ok(CellValue::DateTime(date(2024, 3, 15).and_hms_opt(9, 30, 0).unwrap()))
        );
        assert_eq!(
            cell(CellType::IsoDuration, "PT09H30M00S").to_value(),
            Ok(CellValue::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()))
        );
        assert!(cell(CellType::IsoDuration, "PT25H00M00S").to_value().is_err());
    }

    #[test]
    fn reference() {
        assert_eq!(cell(CellType::Number, "1").reference(), "C2");
    }
}

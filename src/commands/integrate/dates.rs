use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const DAY_FIRST_DATETIME_FORMATS: &[&str] =
    &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M", "%d-%m-%Y %H:%M"];
const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y"];

const MONTH_FIRST_DATETIME_FORMATS: &[&str] =
    &["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M", "%m-%d-%Y %H:%M"];
const MONTH_FIRST_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y"];

/// How an all-numeric date such as `05/03/2024` is read. Named-month and
/// ISO dates are unambiguous and ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    DayFirst,
    MonthFirst,
}

impl DateOrder {
    fn datetime_formats(self) -> &'static [&'static str] {
        match self {
            Self::DayFirst => DAY_FIRST_DATETIME_FORMATS,
            Self::MonthFirst => MONTH_FIRST_DATETIME_FORMATS,
        }
    }

    fn date_formats(self) -> &'static [&'static str] {
        match self {
            Self::DayFirst => DAY_FIRST_DATE_FORMATS,
            Self::MonthFirst => MONTH_FIRST_DATE_FORMATS,
        }
    }
}

const MISSING_MARKERS: &[&str] = &["unknown", "nan", "nat", "none", "null", "-"];

/// Multi-format publish-date parser producing UTC-naive timestamps.
pub struct DateParser {
    day_first: Regex,
    month_first: Regex,
}

impl DateParser {
    pub fn new() -> Result<Self> {
        let day_first = Regex::new(
            r"(?i)^(?:[a-z]+,\s*)?(\d{1,2})\s+([a-z]+)\.?\s+(\d{4})(?:[,\s]+(?:pukul\s+)?(\d{1,2})[:.](\d{2})(?:[:.](\d{2}))?)?\s*(wib|wita|wit|utc|gmt)?$",
        )
        .context("failed to compile day-first date regex")?;
        let month_first = Regex::new(
            r"(?i)^(?:[a-z]+,\s*)?([a-z]+)\.?\s+(\d{1,2}),?\s+(\d{4})(?:[,\s]+(\d{1,2}):(\d{2})(?::(\d{2}))?)?\s*(wib|wita|wit|utc|gmt)?$",
        )
        .context("failed to compile month-first date regex")?;

        Ok(Self {
            day_first,
            month_first,
        })
    }

    /// Returns `None` for anything that cannot be read as a publish date.
    pub fn parse(&self, raw: &str, order: DateOrder) -> Option<NaiveDateTime> {
        let value = raw.trim();
        let lowered = value.to_lowercase();
        if value.is_empty() || MISSING_MARKERS.contains(&lowered.as_str()) {
            return None;
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(parsed.naive_utc());
        }
        for format in OFFSET_FORMATS {
            if let Ok(parsed) = DateTime::parse_from_str(value, format) {
                return Some(parsed.naive_utc());
            }
        }
        for format in NAIVE_DATETIME_FORMATS.iter().chain(order.datetime_formats()) {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
                return Some(parsed);
            }
        }
        for format in DATE_FORMATS.iter().chain(order.date_formats()) {
            if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
                return parsed.and_hms_opt(0, 0, 0);
            }
        }

        if let Some(captures) = self.day_first.captures(value) {
            return named_month_timestamp(&captures, 1, 2);
        }
        if let Some(captures) = self.month_first.captures(value) {
            return named_month_timestamp(&captures, 2, 1);
        }

        None
    }
}

fn named_month_timestamp(
    captures: &Captures<'_>,
    day_group: usize,
    month_group: usize,
) -> Option<NaiveDateTime> {
    let day = captures.get(day_group)?.as_str().parse::<u32>().ok()?;
    let month = month_number(captures.get(month_group)?.as_str())?;
    let year = captures.get(3)?.as_str().parse::<i32>().ok()?;
    let hour = capture_number(captures, 4).unwrap_or(0);
    let minute = capture_number(captures, 5).unwrap_or(0);
    let second = capture_number(captures, 6).unwrap_or(0);

    let local = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset_hours = captures
        .get(7)
        .map(|zone| zone_offset_hours(zone.as_str()))
        .unwrap_or(0);

    local.checked_sub_signed(Duration::hours(offset_hours))
}

fn capture_number(captures: &Captures<'_>, group: usize) -> Option<u32> {
    captures.get(group)?.as_str().parse::<u32>().ok()
}

fn zone_offset_hours(zone: &str) -> i64 {
    match zone.to_ascii_lowercase().as_str() {
        "wib" => 7,
        "wita" => 8,
        "wit" => 9,
        _ => 0,
    }
}

/// Indonesian and English month names and their common abbreviations.
fn month_number(name: &str) -> Option<u32> {
    let month = match name.trim_end_matches('.').to_lowercase().as_str() {
        "januari" | "january" | "jan" => 1,
        "februari" | "pebruari" | "february" | "feb" | "peb" => 2,
        "maret" | "march" | "mar" => 3,
        "april" | "apr" => 4,
        "mei" | "may" => 5,
        "juni" | "june" | "jun" => 6,
        "juli" | "july" | "jul" => 7,
        "agustus" | "august" | "agu" | "agt" | "agus" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "oktober" | "october" | "okt" | "oct" => 10,
        "november" | "nopember" | "nov" | "nop" => 11,
        "desember" | "december" | "des" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

pub fn format_output_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_day(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d").to_string()
}

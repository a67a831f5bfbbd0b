use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::{macros::format_description, Date, Month};

use super::ValidationError;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 2099;

/// The calendar month a reading belongs to.
///
/// Stored and exchanged as a `Mon-YY` token (`Jan-24`). Two-digit years always
/// resolve to 2000..=2099, so only that range can be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportingMonth {
    year: i32,
    month: Month,
}

pub fn is_leap_year(year: i32) -> bool {
    time::util::is_leap_year(year)
}

pub fn days_in_year(year: i32) -> u16 {
    time::util::days_in_year(year)
}

impl ReportingMonth {
    pub fn new(year: i32, month: Month) -> Result<Self, ValidationError> {
        Ok(Self {
            year: Self::check_year(year)?,
            month,
        })
    }

    pub fn check_year(year: i32) -> Result<i32, ValidationError> {
        if (MIN_YEAR..=MAX_YEAR).contains(&year) {
            Ok(year)
        } else {
            Err(ValidationError::YearOutOfRange(year))
        }
    }

    /// Parse a `Mon-YY` token. The month abbreviation is matched case-insensitively.
    pub fn parse_token(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::MonthToken(raw.to_string());

        let (abbr, yy) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let index = MONTH_ABBREVIATIONS
            .iter()
            .position(|m| m.eq_ignore_ascii_case(abbr))
            .ok_or_else(invalid)?;
        if yy.len() != 2 || !yy.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let yy: i32 = yy.parse().map_err(|_| invalid())?;
        let month = Month::try_from(index as u8 + 1).map_err(|_| invalid())?;

        Self::new(MIN_YEAR + yy, month)
    }

    /// Parse a calendar `YYYY-MM` value, as supplied by month pickers.
    pub fn parse_year_month(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let date = Date::parse(
            &format!("{trimmed}-01"),
            format_description!("[year]-[month]-[day]"),
        )
        .map_err(|_| ValidationError::YearMonth(raw.to_string()))?;

        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn abbreviation(&self) -> &'static str {
        month_abbreviation(self.month)
    }

    pub fn days_in_month(&self) -> u8 {
        time::util::days_in_year_month(self.year, self.month)
    }

    /// The following calendar month, if it is still representable.
    pub fn succ(&self) -> Option<Self> {
        let next = self.month.next();
        let year = if next == Month::January {
            self.year + 1
        } else {
            self.year
        };
        Self::new(year, next).ok()
    }

    /// `count` consecutive months starting at `start`, truncated at the end of
    /// the representable range.
    pub fn series(start: Self, count: usize) -> Vec<Self> {
        std::iter::successors(Some(start), Self::succ)
            .take(count)
            .collect()
    }
}

pub(crate) fn month_abbreviation(month: Month) -> &'static str {
    MONTH_ABBREVIATIONS[month as usize - 1]
}

impl Ord for ReportingMonth {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.month as u8).cmp(&(other.year, other.month as u8))
    }
}

impl PartialOrd for ReportingMonth {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ReportingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.abbreviation(), self.year.rem_euclid(100))
    }
}

impl FromStr for ReportingMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_token(s)
    }
}

impl Serialize for ReportingMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReportingMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_token(&raw).map_err(de::Error::custom)
    }
}

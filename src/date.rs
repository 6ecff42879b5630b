use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Sunday-first, matching the index produced by `day_of_week`.
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// An immutable calendar date with no time or timezone attached.
///
/// A `DateValue` can only be built through [`DateValue::new`] (or a checked
/// conversion), so every value in circulation is a real calendar day. It is
/// `Copy`: storing one in an entity always takes a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDate", into = "RawDate")]
pub struct DateValue {
    day: u32,
    month: u32,
    year: i32,
}

#[derive(Serialize, Deserialize)]
struct RawDate {
    day: u32,
    month: u32,
    year: i32,
}

impl TryFrom<RawDate> for DateValue {
    type Error = ModelError;

    fn try_from(raw: RawDate) -> Result<Self> {
        DateValue::new(raw.day, raw.month, raw.year)
    }
}

impl From<DateValue> for RawDate {
    fn from(date: DateValue) -> Self {
        RawDate {
            day: date.day,
            month: date.month,
            year: date.year,
        }
    }
}

impl DateValue {
    /// Builds a date, checking year and month first and then the day
    /// against the length of that month.
    pub fn new(day: u32, month: u32, year: i32) -> Result<Self> {
        let invalid = ModelError::InvalidDate { day, month, year };
        if year < 0 || !(1..=12).contains(&month) {
            return Err(invalid);
        }
        if day < 1 || day > days_in(month, year) {
            return Err(invalid);
        }
        Ok(Self { day, month, year })
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Strictly earlier than `other`; equal dates are not before each other.
    pub fn is_before(&self, other: &DateValue) -> bool {
        self < other
    }

    pub fn is_leap_year(&self) -> bool {
        is_leap(self.year)
    }

    pub fn days_in_month(&self) -> u32 {
        days_in(self.month, self.year)
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    pub fn day_of_week(&self) -> Weekday {
        match self.to_naive_date() {
            Some(d) => d.weekday(),
            None => self.day_of_week_by_formula(),
        }
    }

    /// Sakamoto's method. Only reached for years past chrono's last
    /// representable year, which `DateValue` still accepts.
    fn day_of_week_by_formula(&self) -> Weekday {
        const OFFSETS: [i64; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
        let mut y = i64::from(self.year);
        if self.month < 3 {
            y -= 1;
        }
        let idx = y + y.div_euclid(4) - y.div_euclid(100)
            + y.div_euclid(400)
            + OFFSETS[(self.month - 1) as usize]
            + i64::from(self.day);
        WEEKDAYS[idx.rem_euclid(7) as usize]
    }

    pub fn day_name(&self) -> &'static str {
        match self.day_of_week() {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    /// The date `days` days later.
    pub fn step_forward(&self, days: u32) -> Result<DateValue> {
        self.to_naive_date()
            .and_then(|d| d.checked_add_days(Days::new(u64::from(days))))
            .and_then(|d| DateValue::try_from(d).ok())
            .ok_or_else(|| ModelError::invalid(format!("cannot step {} days past {}", days, self)))
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl TryFrom<NaiveDate> for DateValue {
    type Error = ModelError;

    fn try_from(date: NaiveDate) -> Result<Self> {
        DateValue::new(date.day(), date.month(), date.year())
    }
}

impl Ord for DateValue {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.month, self.day).cmp(&(other.year, other.month, other.day))
    }
}

impl PartialOrd for DateValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

fn is_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in(month: u32, year: i32) -> u32 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Source of "today" for deadline validation.
pub trait Clock: fmt::Debug {
    fn today(&self) -> DateValue;
}

/// Reads the local system date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DateValue {
        let now = Local::now().date_naive();
        DateValue {
            day: now.day(),
            month: now.month(),
            year: now.year().max(0),
        }
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateValue);

impl Clock for FixedClock {
    fn today(&self) -> DateValue {
        self.0
    }
}
